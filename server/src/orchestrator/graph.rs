use super::errors::GraphError;
use crate::cloud::ResourceSpec;
use std::collections::{BTreeSet, HashMap};

/// Validated set of resource specs plus the order they can be created in.
#[derive(Debug, Clone)]
pub struct ResourceGraph {
    specs: Vec<ResourceSpec>,
    /// For each spec, the indices of the specs it waits for
    dependencies: Vec<BTreeSet<usize>>,
    order: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct ResourceGraphBuilder {
    specs: Vec<ResourceSpec>,
    extra_edges: Vec<(String, String)>,
}

impl ResourceGraphBuilder {
    pub fn add(mut self, spec: ResourceSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// `child` is created only after `dependency`, on top of the implicit
    /// parent edge.
    pub fn depends_on(mut self, child: impl Into<String>, dependency: impl Into<String>) -> Self {
        self.extra_edges.push((child.into(), dependency.into()));
        self
    }

    pub fn build(self) -> Result<ResourceGraph, GraphError> {
        let mut index = HashMap::with_capacity(self.specs.len());
        for (i, spec) in self.specs.iter().enumerate() {
            if index.insert(spec.name().to_string(), i).is_some() {
                return Err(GraphError::DuplicateName(spec.name().to_string()));
            }
        }

        let mut dependencies = vec![BTreeSet::new(); self.specs.len()];
        for (i, spec) in self.specs.iter().enumerate() {
            if let Some(parent) = check_parent(spec, &self.specs, &index)? {
                dependencies[i].insert(parent);
            }
        }
        for (child, dependency) in &self.extra_edges {
            let lookup = |name: &str| {
                index.get(name).copied().ok_or_else(|| GraphError::UnknownReference {
                    name: child.clone(),
                    missing: name.to_string(),
                })
            };
            let child_idx = lookup(child)?;
            let dependency_idx = lookup(dependency)?;
            dependencies[child_idx].insert(dependency_idx);
        }

        let order = topological_sort(&self.specs, &dependencies)?;
        Ok(ResourceGraph {
            specs: self.specs,
            dependencies,
            order,
        })
    }
}

fn check_parent(
    spec: &ResourceSpec,
    specs: &[ResourceSpec],
    index: &HashMap<String, usize>,
) -> Result<Option<usize>, GraphError> {
    let kind = spec.kind();
    match (kind.parent_kind(), spec.parent()) {
        (None, None) => Ok(None),
        (None, Some(parent_name)) => Err(GraphError::UnexpectedParent {
            name: spec.name().to_string(),
            parent_name: parent_name.to_string(),
        }),
        (Some(_), None) => Err(GraphError::MissingParentReference {
            name: spec.name().to_string(),
            kind,
        }),
        (Some(expected), Some(parent_name)) => {
            let parent_idx =
                index
                    .get(parent_name)
                    .copied()
                    .ok_or_else(|| GraphError::UnknownReference {
                        name: spec.name().to_string(),
                        missing: parent_name.to_string(),
                    })?;
            let parent_kind = specs[parent_idx].kind();
            if parent_kind != expected {
                return Err(GraphError::ParentKindMismatch {
                    name: spec.name().to_string(),
                    kind,
                    parent_name: parent_name.to_string(),
                    parent: parent_kind,
                });
            }
            Ok(Some(parent_idx))
        }
    }
}

/// Kahn's algorithm. Among the specs that are ready, the one declared first
/// goes first, so a graph declared in a valid order keeps that order.
fn topological_sort(
    specs: &[ResourceSpec],
    dependencies: &[BTreeSet<usize>],
) -> Result<Vec<usize>, GraphError> {
    let mut pending: Vec<usize> = dependencies.iter().map(BTreeSet::len).collect();
    let mut dependents = vec![Vec::new(); specs.len()];
    for (i, deps) in dependencies.iter().enumerate() {
        for &dep in deps {
            dependents[dep].push(i);
        }
    }

    let mut ready: BTreeSet<usize> = (0..specs.len()).filter(|&i| pending[i] == 0).collect();
    let mut order = Vec::with_capacity(specs.len());

    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &dependent in &dependents[next] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() < specs.len() {
        let stuck = (0..specs.len())
            .filter(|&i| pending[i] > 0)
            .map(|i| specs[i].name().to_string())
            .collect();
        return Err(GraphError::Cycle(stuck));
    }
    Ok(order)
}

impl ResourceGraph {
    pub fn builder() -> ResourceGraphBuilder {
        ResourceGraphBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Names `name` waits for, parent included.
    pub fn dependencies(&self, name: &str) -> Vec<&str> {
        self.specs
            .iter()
            .position(|spec| spec.name() == name)
            .map(|i| {
                self.dependencies[i]
                    .iter()
                    .map(|&dep| self.specs[dep].name())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Creation order: every spec comes after everything it depends on.
    pub fn topological_order(&self) -> impl Iterator<Item = &ResourceSpec> {
        self.order.iter().map(|&i| &self.specs[i])
    }
}
