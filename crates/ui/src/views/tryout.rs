use std::sync::Arc;

use dioxus::prelude::*;
use dioxus_router::{Link, use_navigator};

use services::TryoutRun;
use tryout_core::PlayerSnapshot;
use tryout_core::model::{OptionId, PackageId};

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::ViewError;
use crate::vm::{BadgeVm, OptionVm, TryoutVm};

#[derive(Clone, Debug, PartialEq)]
enum Phase {
    Starting,
    Running,
    Saving,
    Failed(ViewError),
}

#[component]
pub fn TryoutView(package_id: u64) -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let tryout_loop = ctx.tryout_loop();

    let mut run = use_signal(|| None::<Arc<TryoutRun>>);
    let mut snapshot = use_signal(|| None::<PlayerSnapshot>);
    let mut phase = use_signal(|| Phase::Starting);

    // Starts the run, mirrors its snapshots into a signal and persists the
    // attempt once the exam ends. Unmounting cancels this future, which drops
    // the run and with it the countdown.
    {
        let tryout_loop = Arc::clone(&tryout_loop);
        use_future(move || {
            let tryout_loop = Arc::clone(&tryout_loop);
            async move {
                let started = match tryout_loop.start_tryout(PackageId::new(package_id)).await {
                    Ok(started) => Arc::new(started),
                    Err(err) => {
                        log::warn!("failed to start tryout {package_id}: {err}");
                        phase.set(Phase::Failed(ViewError::from(&err)));
                        return;
                    }
                };
                run.set(Some(Arc::clone(&started)));
                phase.set(Phase::Running);

                let mut rx = started.subscribe();
                loop {
                    let current = rx.borrow_and_update().clone();
                    let finished = current.is_finished();
                    snapshot.set(Some(current));
                    if finished {
                        break;
                    }
                    if rx.changed().await.is_err() {
                        return;
                    }
                }

                phase.set(Phase::Saving);
                match tryout_loop.persist_if_finished(&started).await {
                    Ok(Some(attempt_id)) => {
                        navigator.replace(Route::AttemptResult { attempt_id });
                    }
                    Ok(None) => {}
                    Err(err) => {
                        log::warn!("failed to save tryout {package_id}: {err}");
                        phase.set(Phase::Failed(ViewError::Unknown));
                    }
                }
            }
        });
    }

    let with_run = move |f: &dyn Fn(&TryoutRun)| {
        if let Some(current) = run.read().as_deref() {
            f(current);
        }
    };

    let on_select = use_callback(move |option_id: OptionId| {
        with_run(&|run| {
            if let Some(question_id) = run.snapshot().current_question {
                run.select_answer(question_id, option_id);
            }
        });
    });
    let on_toggle_doubt = use_callback(move |()| {
        with_run(&|run| {
            if let Some(question_id) = run.snapshot().current_question {
                run.toggle_doubt(question_id);
            }
        });
    });
    let on_jump = use_callback(move |index: usize| {
        with_run(&|run| {
            run.go_to_question(index);
        });
    });
    let on_previous = use_callback(move |()| {
        with_run(&|run| {
            run.previous_question();
        });
    });
    let on_next = use_callback(move |()| {
        with_run(&|run| {
            run.next_question();
        });
    });
    let on_submit_block = use_callback(move |block_index: usize| {
        with_run(&|run| {
            run.submit_block(block_index);
        });
    });
    // Manual finish stops the countdown at once; the snapshot watcher then
    // persists the attempt and navigates to the result.
    let on_finish = use_callback(move |()| {
        with_run(&|run| {
            run.finish();
        });
    });
    let on_retry_save = {
        let tryout_loop = Arc::clone(&tryout_loop);
        use_callback(move |()| {
            let Some(current) = run.read().clone() else {
                return;
            };
            let tryout_loop = Arc::clone(&tryout_loop);
            spawn(async move {
                phase.set(Phase::Saving);
                match tryout_loop.finalize_attempt(&current).await {
                    Ok(attempt_id) => {
                        navigator.replace(Route::AttemptResult { attempt_id });
                    }
                    Err(err) => {
                        log::warn!("retrying save failed: {err}");
                        phase.set(Phase::Failed(ViewError::Unknown));
                    }
                }
            });
        })
    };

    let on_key = use_callback(move |evt: KeyboardEvent| {
        let enabled = snapshot
            .read()
            .as_ref()
            .is_some_and(|s| s.is_started && !s.is_finished());
        if !enabled {
            return;
        }
        match evt.data.key() {
            Key::ArrowLeft => {
                evt.prevent_default();
                on_previous.call(());
            }
            Key::ArrowRight => {
                evt.prevent_default();
                on_next.call(());
            }
            Key::Character(value) if value.eq_ignore_ascii_case("d") => {
                evt.prevent_default();
                on_toggle_doubt.call(());
            }
            _ => {}
        }
    });

    let vm = {
        let snapshot_guard = snapshot.read();
        let run_guard = run.read();
        snapshot_guard.as_ref().map(|snap| {
            let question = snap
                .current_question
                .and_then(|id| run_guard.as_ref().and_then(|r| r.question(id)));
            TryoutVm::from_snapshot(snap, question)
        })
    };
    let current_phase = phase.read().clone();

    rsx! {
        div { class: "page tryout", tabindex: "0", onkeydown: move |evt| on_key.call(evt),
            match (current_phase, vm) {
                (Phase::Failed(err), _) => rsx! {
                    p { class: "error", "{err.message()}" }
                    if run.read().as_ref().is_some_and(|r| r.is_finished()) {
                        button { onclick: move |_| on_retry_save.call(()), "Retry saving" }
                    }
                    Link { to: Route::Home {}, "Back to home" }
                },
                (Phase::Starting, _) | (_, None) => rsx! {
                    p { "Loading..." }
                },
                (Phase::Saving, Some(vm)) => rsx! {
                    TryoutHeader { vm: vm.clone() }
                    p { class: "saving", "Saving your answers..." }
                },
                (Phase::Running, Some(vm)) => rsx! {
                    TryoutHeader { vm: vm.clone() }
                    QuestionGrid {
                        badges: vm.badges.clone(),
                        enabled: vm.controls_enabled,
                        on_jump,
                    }
                    QuestionPanel {
                        vm: vm.clone(),
                        on_select,
                        on_toggle_doubt,
                        on_previous,
                        on_next,
                    }
                    div { class: "actions",
                        button {
                            id: "tryout-submit-block",
                            disabled: !vm.controls_enabled,
                            onclick: {
                                let block_index = vm.block_index;
                                move |_| {
                                    if let Some(index) = block_index {
                                        on_submit_block.call(index);
                                    }
                                }
                            },
                            "{vm.submit_label}"
                        }
                        if !vm.is_last_block {
                            button {
                                id: "tryout-finish",
                                class: "danger",
                                disabled: !vm.controls_enabled,
                                onclick: move |_| on_finish.call(()),
                                "Finish tryout"
                            }
                        }
                    }
                },
            }
        }
    }
}

#[component]
fn TryoutHeader(vm: TryoutVm) -> Element {
    let timer_class = if vm.is_low_time { "timer low" } else { "timer" };
    rsx! {
        header { class: "tryout-header",
            div {
                h2 { "{vm.title}" }
                p { class: "block-label", "{vm.block_label} · {vm.block_name}" }
            }
            if let Some(label) = vm.finish_label {
                span { class: "timer", "{label}" }
            } else {
                span { class: "{timer_class}", "{vm.countdown}" }
            }
        }
    }
}

#[component]
fn QuestionGrid(badges: Vec<BadgeVm>, enabled: bool, on_jump: Callback<usize>) -> Element {
    rsx! {
        nav { class: "question-grid",
            for badge in badges {
                button {
                    key: "{badge.index}",
                    class: "{badge.class()}",
                    disabled: !enabled,
                    onclick: {
                        let index = badge.index;
                        move |_| on_jump.call(index)
                    },
                    "{badge.number}"
                }
            }
        }
    }
}

#[component]
fn QuestionPanel(
    vm: TryoutVm,
    on_select: Callback<OptionId>,
    on_toggle_doubt: Callback<()>,
    on_previous: Callback<()>,
    on_next: Callback<()>,
) -> Element {
    let (doubt_class, doubt_label) = if vm.is_doubtful {
        ("doubt active", "Unmark doubt")
    } else {
        ("doubt", "Mark as doubtful")
    };
    rsx! {
        section { class: "question",
            p { class: "question-label", "{vm.question_label}" }
            match vm.question_text.clone() {
                Some(text) => rsx! {
                    p { class: "question-text", "{text}" }
                    ul { class: "options",
                        for option in vm.options.clone() {
                            OptionButton {
                                key: "{option.id}",
                                option,
                                enabled: vm.controls_enabled,
                                on_select,
                            }
                        }
                    }
                },
                None if vm.question_id.is_some() => rsx! {
                    p { class: "empty", "This question is not available." }
                },
                None => rsx! {},
            }
            div { class: "question-actions",
                button {
                    disabled: !vm.can_previous,
                    onclick: move |_| on_previous.call(()),
                    "Previous"
                }
                button {
                    class: doubt_class,
                    disabled: !vm.controls_enabled || vm.question_id.is_none(),
                    onclick: move |_| on_toggle_doubt.call(()),
                    "{doubt_label}"
                }
                button {
                    disabled: !vm.can_next,
                    onclick: move |_| on_next.call(()),
                    "Next"
                }
            }
        }
    }
}

#[component]
fn OptionButton(option: OptionVm, enabled: bool, on_select: Callback<OptionId>) -> Element {
    let class = if option.is_selected { "option selected" } else { "option" };
    rsx! {
        li {
            button {
                class,
                disabled: !enabled,
                onclick: {
                    let id = option.id;
                    move |_| on_select.call(id)
                },
                span { class: "option-label", "{option.label}" }
                span { class: "option-text", "{option.text}" }
            }
        }
    }
}
