use dioxus::prelude::*;
use dioxus_router::Link;

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{AttemptCardVm, PackageCardVm, map_attempt_cards, map_package_cards};

const PACKAGE_LIMIT: u32 = 50;
const RECENT_LIMIT: u32 = 10;

#[derive(Clone, Debug, PartialEq)]
struct HomeData {
    packages: Vec<PackageCardVm>,
    recent: Vec<AttemptCardVm>,
}

#[component]
pub fn HomeView() -> Element {
    let ctx = use_context::<AppContext>();
    let catalog = ctx.catalog();
    let history = ctx.history();
    let package_id = ctx.default_package_id();

    let mut resource = use_resource(move || {
        let catalog = catalog.clone();
        let history = history.clone();
        async move {
            let packages = catalog
                .list_packages(PACKAGE_LIMIT)
                .await
                .map_err(|err| ViewError::from(&err))?;
            let recent = history
                .list_recent_attempts(package_id, RECENT_LIMIT)
                .await
                .map_err(|err| ViewError::from(&err))?;
            Ok::<_, ViewError>(HomeData {
                packages: map_package_cards(&packages),
                recent: map_attempt_cards(&recent),
            })
        }
    });

    let state = view_state_from_resource(&resource);

    rsx! {
        div { class: "page",
            h2 { "Tryout packages" }

            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(data) => rsx! {
                    if data.packages.is_empty() {
                        p { class: "empty", "No packages yet. Import one with `app import <file.json>`." }
                    } else {
                        ul { class: "packages",
                            for card in data.packages {
                                PackageCard { key: "{card.id}", card }
                            }
                        }
                    }

                    h3 { "Recent attempts" }
                    if data.recent.is_empty() {
                        p { class: "empty", "No attempts yet." }
                    } else {
                        ul { class: "attempts",
                            for card in data.recent {
                                AttemptCard { key: "{card.id}", card }
                            }
                        }
                    }
                },
                ViewState::Error(err) => rsx! {
                    p { class: "error", "{err.message()}" }
                    button { onclick: move |_| resource.restart(), "Retry" }
                },
            }
        }
    }
}

#[component]
fn PackageCard(card: PackageCardVm) -> Element {
    rsx! {
        li { class: "package-card",
            span { class: "package-title", "{card.title}" }
            span { class: "package-summary", "{card.summary}" }
            Link { class: "button primary", to: Route::Tryout { package_id: card.id }, "Start" }
        }
    }
}

#[component]
fn AttemptCard(card: AttemptCardVm) -> Element {
    rsx! {
        li { class: "attempt-card",
            Link { class: "attempt-link", to: Route::AttemptResult { attempt_id: card.id },
                span { class: "attempt-date", "{card.finished_at_str}" }
                span { class: "attempt-score", "{card.score}" }
            }
            p { "{card.detail}" }
        }
    }
}
