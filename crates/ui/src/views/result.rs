use dioxus::prelude::*;
use dioxus_router::Link;

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{ResultRowVm, ResultVm, map_result};

#[component]
pub fn ResultView(attempt_id: i64) -> Element {
    let ctx = use_context::<AppContext>();
    let history = ctx.history();

    let resource = use_resource(move || {
        let history = history.clone();
        async move {
            let attempt = history
                .get_attempt(attempt_id)
                .await
                .map_err(|err| ViewError::from(&err))?;
            Ok::<_, ViewError>(map_result(&attempt))
        }
    });

    let state = view_state_from_resource(&resource);

    rsx! {
        div { class: "page",
            h2 { "Tryout Result" }

            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(vm) => rsx! {
                    ResultDetails { vm }
                },
                ViewState::Error(err) => rsx! {
                    p { class: "error", "{err.message()}" }
                    Link { to: Route::Home {}, "Back to home" }
                },
            }
        }
    }
}

#[component]
fn ResultDetails(vm: ResultVm) -> Element {
    rsx! {
        dl { class: "summary",
            dt { "Result" }
            dd { "{vm.reason_label}" }

            dt { "Started" }
            dd { "{vm.started_at_str}" }

            dt { "Finished" }
            dd { "{vm.finished_at_str}" }

            dt { "Duration" }
            dd { "{vm.elapsed_str}" }

            dt { "Score" }
            dd { "{vm.totals.correct} / {vm.totals.total} ({vm.score_pct}%)" }
        }

        ResultTable { rows: vm.rows.clone(), totals: vm.totals.clone() }

        div { class: "actions",
            Link { class: "button", to: Route::Home {}, "Home" }
            Link {
                class: "button primary",
                to: Route::Tryout { package_id: vm.package_id.value() },
                "Try again"
            }
        }
    }
}

#[component]
pub fn ResultTable(rows: Vec<ResultRowVm>, totals: ResultRowVm) -> Element {
    rsx! {
        table { class: "result-table",
            thead {
                tr {
                    th { "Block" }
                    th { "Questions" }
                    th { "Answered" }
                    th { "Blank" }
                    th { "Doubtful" }
                    th { "Correct" }
                    th { "Incorrect" }
                }
            }
            tbody {
                for row in rows {
                    ResultRow { row }
                }
            }
            tfoot {
                ResultRow { row: totals }
            }
        }
    }
}

#[component]
fn ResultRow(row: ResultRowVm) -> Element {
    rsx! {
        tr {
            td { "{row.block_name}" }
            td { "{row.total}" }
            td { "{row.answered}" }
            td { "{row.blank}" }
            td { "{row.doubtful}" }
            td { "{row.correct}" }
            td { "{row.incorrect}" }
        }
    }
}
