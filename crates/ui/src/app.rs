use dioxus::prelude::*;
use dioxus_router::Router;

use crate::routes::Route;

/// Window, document and top bar title.
pub const APP_TITLE: &str = "SNBT Tryout";

#[component]
pub fn App() -> Element {
    rsx! {
        document::Stylesheet { href: asset!("/assets/style.css") }
        document::Title { "{APP_TITLE}" }

        div { class: "app-root",
            ErrorBoundary {
                handle_error: |errors: ErrorContext| rsx! {
                    FatalError { detail: format!("{errors:?}") }
                },
                Router::<Route> {}
            }
        }
    }
}

/// Shown when a view panics. Attempts are persisted as soon as a tryout
/// finishes, so only an unfinished run is lost.
#[component]
fn FatalError(detail: String) -> Element {
    rsx! {
        div { class: "fatal",
            h1 { "Something went wrong" }
            p { "Finished tryouts are already saved. Restart the app to continue." }
            pre { "{detail}" }
        }
    }
}
