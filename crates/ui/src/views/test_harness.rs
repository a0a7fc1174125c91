use std::sync::Arc;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use services::{
    AppServices, AttemptHistoryService, Clock, PackageCatalogService, TryoutLoopService,
};
use storage::repository::{AttemptRepository, Storage};
use tryout_core::model::PackageId;
use tryout_core::time::fixed_now;

use crate::context::{UiApp, build_app_context};
use crate::views::{HomeView, ResultView, TryoutView};

pub const SAMPLE_PACKAGE: &str = r#"
    {
        "id": 1,
        "title": "Tryout SNBT #1",
        "blocks": [
            {
                "id": 11,
                "name": "Penalaran Umum",
                "duration_minutes": 10,
                "questions": [
                    {
                        "id": 101,
                        "text": "Semua kucing adalah mamalia. Tom adalah kucing. Maka ...",
                        "options": [
                            { "label": "A", "text": "Tom adalah mamalia" },
                            { "label": "B", "text": "Tom bukan mamalia" }
                        ],
                        "correct": "A"
                    },
                    {
                        "id": 102,
                        "text": "3, 6, 12, 24, ...",
                        "options": [
                            { "label": "A", "text": "36" },
                            { "label": "B", "text": "48" }
                        ],
                        "correct": "B"
                    }
                ]
            },
            {
                "id": 12,
                "name": "Pengetahuan Kuantitatif",
                "duration_minutes": 15,
                "questions": [
                    {
                        "id": 201,
                        "text": "Berapakah 15% dari 200?",
                        "options": [
                            { "label": "A", "text": "30" },
                            { "label": "B", "text": "15" }
                        ],
                        "correct": "A"
                    }
                ]
            }
        ]
    }
"#;

#[derive(Clone)]
struct TestApp {
    package_id: PackageId,
    catalog: Arc<PackageCatalogService>,
    history: Arc<AttemptHistoryService>,
    tryout_loop: Arc<TryoutLoopService>,
}

impl UiApp for TestApp {
    fn default_package_id(&self) -> PackageId {
        self.package_id
    }

    fn catalog(&self) -> Arc<PackageCatalogService> {
        Arc::clone(&self.catalog)
    }

    fn history(&self) -> Arc<AttemptHistoryService> {
        Arc::clone(&self.history)
    }

    fn tryout_loop(&self) -> Arc<TryoutLoopService> {
        Arc::clone(&self.tryout_loop)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Home,
    Result(i64),
    Tryout(u64),
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
    view: ViewKind,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for ViewHarnessProps {}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view);
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Home => rsx! { HomeView {} },
        ViewKind::Result(attempt_id) => rsx! { ResultView { attempt_id } },
        ViewKind::Tryout(package_id) => rsx! { TryoutView { package_id } },
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub services: AppServices,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Rebuild, then let pending resources and futures settle.
    pub async fn settle(&mut self) {
        self.rebuild();
        for _ in 0..5 {
            self.drive_async().await;
        }
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

/// In-memory services with [`SAMPLE_PACKAGE`] imported.
pub async fn seeded_services() -> AppServices {
    let services = AppServices::from_storage(&Storage::in_memory(), Clock::fixed(fixed_now()));
    services
        .import()
        .import_json(SAMPLE_PACKAGE)
        .await
        .expect("import sample package");
    services
}

pub async fn setup_view_harness(view: ViewKind) -> ViewHarness {
    let services = seeded_services().await;
    let history = services.history();
    build_harness(view, services, history)
}

/// Harness whose history reads from `attempts` instead of the seeded storage.
pub async fn setup_view_harness_with_attempt_repo(
    view: ViewKind,
    attempts: Arc<dyn AttemptRepository>,
) -> ViewHarness {
    let services = seeded_services().await;
    let history = Arc::new(AttemptHistoryService::new(attempts));
    build_harness(view, services, history)
}

fn build_harness(
    view: ViewKind,
    services: AppServices,
    history: Arc<AttemptHistoryService>,
) -> ViewHarness {
    let app = Arc::new(TestApp {
        package_id: PackageId::new(1),
        catalog: services.catalog(),
        history,
        tryout_loop: services.tryout_loop(),
    });
    let dom = VirtualDom::new_with_props(ViewRouterHarness, ViewHarnessProps { app, view });
    ViewHarness { dom, services }
}
