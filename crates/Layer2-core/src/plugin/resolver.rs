//! Dependency Resolver - 의존성 순서 정렬
//!
//! 깊이 우선 위상 정렬입니다. 각 노드의 의존성을 먼저 방문한 뒤 노드를
//! 출력에 추가합니다.
//!
//! - 입력에 없는 의존성 ID는 조용히 무시합니다 (선택적 의존성).
//! - 진행 중인 노드를 다시 만나면(사이클) 경고를 남기고 그 간선만 건너뜁니다.
//! - 결과는 항상 입력 원소 각각을 정확히 한 번씩 포함합니다.
//! - 루트 방문은 입력 순서를 따르므로 서로 관계없는 노드들은 가능한 한
//!   입력 순서를 유지합니다.

use super::manifest::PluginManifest;
use std::collections::HashMap;
use tracing::{trace, warn};

/// 의존성 그래프의 노드
pub trait DependencyNode {
    fn node_id(&self) -> &str;
    fn node_dependencies(&self) -> &[String];
}

impl DependencyNode for PluginManifest {
    fn node_id(&self) -> &str {
        &self.id
    }

    fn node_dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

/// 정렬 결과와 진단 정보
#[derive(Debug, Clone)]
pub struct Resolution<T> {
    /// 의존성 순서
    pub order: Vec<T>,

    /// 끊어낸 사이클 간선 (dependent, dependency)
    pub cycles: Vec<(String, String)>,

    /// 입력에 없어 무시한 의존성 (dependent, dependency)
    pub missing: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    InProgress,
    Done,
}

/// 의존성 순서로 정렬
pub fn resolve<T: DependencyNode + Clone>(nodes: &[T]) -> Vec<T> {
    resolve_with_report(nodes).order
}

/// 의존성 순서로 정렬하고 사이클/누락 정보를 함께 반환
pub fn resolve_with_report<T: DependencyNode + Clone>(nodes: &[T]) -> Resolution<T> {
    // 같은 ID가 여러 번 있으면 첫 번째 노드가 간선의 대상이 됨
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        index.entry(node.node_id()).or_insert(i);
    }

    let mut walker = Walker {
        nodes,
        index,
        state: vec![Visit::Unvisited; nodes.len()],
        order: Vec::with_capacity(nodes.len()),
        cycles: Vec::new(),
        missing: Vec::new(),
    };

    for i in 0..nodes.len() {
        if walker.state[i] == Visit::Unvisited {
            walker.visit(i);
        }
    }

    Resolution {
        order: walker.order.into_iter().map(|i| nodes[i].clone()).collect(),
        cycles: walker.cycles,
        missing: walker.missing,
    }
}

struct Walker<'a, T> {
    nodes: &'a [T],
    index: HashMap<&'a str, usize>,
    state: Vec<Visit>,
    order: Vec<usize>,
    cycles: Vec<(String, String)>,
    missing: Vec<(String, String)>,
}

impl<'a, T: DependencyNode> Walker<'a, T> {
    fn visit(&mut self, i: usize) {
        self.state[i] = Visit::InProgress;
        let nodes = self.nodes;
        let node = &nodes[i];

        for dep in node.node_dependencies() {
            let Some(&j) = self.index.get(dep.as_str()) else {
                trace!(plugin_id = node.node_id(), dependency = %dep, "Ignoring unknown dependency");
                self.missing.push((node.node_id().to_string(), dep.clone()));
                continue;
            };

            match self.state[j] {
                Visit::Done => {}
                Visit::InProgress => {
                    warn!(
                        plugin_id = node.node_id(),
                        dependency = %dep,
                        "Dependency cycle detected, skipping edge"
                    );
                    self.cycles.push((node.node_id().to_string(), dep.clone()));
                }
                Visit::Unvisited => self.visit(j),
            }
        }

        self.state[i] = Visit::Done;
        self.order.push(i);
    }
}
