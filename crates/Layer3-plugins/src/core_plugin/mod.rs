//! Core Plugin - 요소 추적과 기본 UI 기여
//!
//! 룰 소유권의 전역 폴백(`"core"`)이기도 합니다.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};
use uilint_core::{
    Analyzer, Cleanup, Command, ElementDescriptor, InspectorPanel, InspectorRequest, Issue,
    LocationKey, Plugin, PluginManifest, Services, Severity, CORE_PLUGIN_ID,
};
use uilint_foundation::Result;

/// 상태 slice 이름
pub const CORE_SLICE: &str = "core";

/// 위치 없는 요소를 보고하는 룰
pub const UNLOCATED_RULE: &str = "core/unlocated-element";

/// core slice
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreSlice {
    pub element_count: usize,
    pub connected: bool,
    pub selected_element: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CorePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    element_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    connected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    selected_element: Option<Option<String>>,
}

impl CorePatch {
    fn empty() -> Self {
        Self {
            element_count: None,
            connected: None,
            selected_element: None,
        }
    }
}

/// 기본 플러그인
#[derive(Default)]
pub struct CorePlugin {
    /// 페이지에 있는 요소 ID
    elements: Arc<Mutex<HashSet<String>>>,
}

impl CorePlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, services: &Services) -> CoreSlice {
        services.get_state(CORE_SLICE)
    }

    /// 인스펙터 대상 요소 선택
    pub fn select_element(&self, services: &Services, element_id: Option<&str>) -> Result<()> {
        let patch = CorePatch {
            selected_element: Some(element_id.map(str::to_string)),
            ..CorePatch::empty()
        };
        services.set_state(CORE_SLICE, &patch)
    }
}

fn write(services: &Services, patch: &CorePatch) {
    if let Err(e) = services.set_state(CORE_SLICE, patch) {
        warn!(error = %e, "Failed to update core slice");
    }
}

fn track(
    elements: &Mutex<HashSet<String>>,
    services: &Services,
    batch: &[ElementDescriptor],
    added: bool,
) {
    let count = {
        let mut set = elements.lock();
        for element in batch {
            if added {
                set.insert(element.id.clone());
            } else {
                set.remove(&element.id);
            }
        }
        set.len()
    };

    write(
        services,
        &CorePatch {
            element_count: Some(count),
            ..CorePatch::empty()
        },
    );
}

/// 위치 키를 해석할 수 없는 요소 보고
fn unlocated_elements(elements: &[ElementDescriptor]) -> Vec<Issue> {
    elements
        .iter()
        .filter(|e| LocationKey::parse(&e.location_key).is_err())
        .map(|e| {
            Issue::new(
                CORE_PLUGIN_ID,
                Severity::Info,
                format!("Element {} has no source location", e.id),
                e.location_key.clone(),
            )
            .with_rule(UNLOCATED_RULE)
        })
        .collect()
}

#[async_trait]
impl Plugin for CorePlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new(CORE_PLUGIN_ID, "Core")
            .with_description("Element tracking, command palette and inspector basics")
    }

    fn commands(&self) -> Vec<Command> {
        vec![
            Command::new("core.close-palette", "Close command palette", |svc| {
                svc.close_command_palette();
            })
            .with_keywords(["close", "palette"]),
            Command::new("core.inspect-element", "Inspect selected element", |svc| {
                let state: CoreSlice = svc.get_state(CORE_SLICE);
                match state.selected_element {
                    Some(element_id) => {
                        svc.open_inspector(InspectorRequest::Element { element_id })
                    }
                    None => debug!("No element selected"),
                }
            })
            .with_keywords(["inspect", "element"]),
        ]
    }

    fn analyzers(&self) -> Vec<Analyzer> {
        vec![
            Analyzer::new("unlocated-elements", "Unlocated elements", unlocated_elements)
                .with_description("Elements whose location key does not resolve to a source position"),
        ]
    }

    fn inspector_panels(&self) -> Vec<InspectorPanel> {
        vec![InspectorPanel::new("element-details", "Element")]
    }

    async fn initialize(&self, services: &Services) -> Result<Option<Cleanup>> {
        self.elements.lock().clear();
        services.set_state(CORE_SLICE, &CoreSlice::default())?;

        let elements = Arc::clone(&self.elements);
        let svc = services.clone();
        let added = services.on_elements_added(move |batch| track(&elements, &svc, batch, true));

        let elements = Arc::clone(&self.elements);
        let svc = services.clone();
        let removed =
            services.on_elements_removed(move |batch| track(&elements, &svc, batch, false));

        let svc = services.clone();
        let connection = services.on_connection_change(move |connected| {
            write(
                &svc,
                &CorePatch {
                    connected: Some(connected),
                    ..CorePatch::empty()
                },
            );
        });

        Ok(Some(Cleanup::new(move || {
            added.unsubscribe();
            removed.unsubscribe();
            connection.unsubscribe();
        })))
    }

    async fn dispose(&self, _services: &Services) -> Result<()> {
        self.elements.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uilint_core::{ServiceHub, UiActions};
    use uilint_foundation::NullSink;

    #[derive(Default)]
    struct Ui(Mutex<Vec<String>>);

    impl UiActions for Ui {
        fn open_inspector(&self, request: InspectorRequest) {
            self.0.lock().push(format!("{request:?}"));
        }

        fn close_command_palette(&self) {
            self.0.lock().push("close".to_string());
        }
    }

    #[tokio::test]
    async fn test_tracks_element_count_and_connection() {
        let hub = ServiceHub::new();
        let plugin = CorePlugin::new();
        let _cleanup = plugin.initialize(&hub.services()).await.unwrap();

        hub.elements_added(&[
            ElementDescriptor::new("a", "src/App.tsx:1:1"),
            ElementDescriptor::new("b", "src/App.tsx:2:1"),
        ]);
        hub.elements_added(&[ElementDescriptor::new("a", "src/App.tsx:1:1")]);
        hub.elements_removed(&[ElementDescriptor::new("b", "src/App.tsx:2:1")]);
        hub.set_connected(true);

        let state = plugin.state(&hub.services());
        assert_eq!(state.element_count, 1);
        assert!(state.connected);
    }

    #[tokio::test]
    async fn test_commands_drive_ui() {
        let ui = Arc::new(Ui::default());
        let hub = ServiceHub::with_parts(Arc::new(NullSink), ui.clone());
        let services = hub.services();
        let plugin = CorePlugin::new();
        plugin.initialize(&services).await.unwrap();

        let commands = plugin.commands();
        commands[1].execute(&services);
        assert!(ui.0.lock().is_empty());

        plugin.select_element(&services, Some("el-7")).unwrap();
        commands[1].execute(&services);
        commands[0].execute(&services);

        let log = ui.0.lock().clone();
        assert_eq!(log.len(), 2);
        assert!(log[0].contains("el-7"));
        assert_eq!(log[1], "close");
    }

    #[test]
    fn test_unlocated_analyzer() {
        let plugin = CorePlugin::new();
        let analyzer = &plugin.analyzers()[0];
        let issues = analyzer.run(&[
            ElementDescriptor::new("a", "src/App.tsx:1:1"),
            ElementDescriptor::new("b", "unknown"),
        ]);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule_id.as_deref(), Some(UNLOCATED_RULE));
    }
}
