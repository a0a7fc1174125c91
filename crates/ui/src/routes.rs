use dioxus::prelude::*;
use dioxus_router::{Link, Outlet, Routable};

use crate::app::APP_TITLE;
use crate::views::{HomeView, ResultView, TryoutView};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", HomeView)] Home {},
        #[route("/tryout/:package_id", TryoutView)] Tryout { package_id: u64 },
        #[route("/result/:attempt_id", ResultView)] AttemptResult { attempt_id: i64 },
}

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app",
            nav { class: "topbar",
                h1 { "{APP_TITLE}" }
                Link { to: Route::Home {}, "Home" }
            }
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}
