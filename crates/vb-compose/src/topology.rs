//! Port-to-store wiring.

use std::collections::BTreeMap;

use vb_project::WiringDef;

/// Where one port of a process reads and writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortWiring {
    pub store: String,
    /// Port variable id -> store variable id.
    pub rename: BTreeMap<String, String>,
}

impl PortWiring {
    pub fn new(store: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            rename: BTreeMap::new(),
        }
    }

    pub fn with_rename(mut self, rename: BTreeMap<String, String>) -> Self {
        self.rename = rename;
        self
    }

    pub fn store_variable<'a>(&'a self, variable: &'a str) -> &'a str {
        self.rename.get(variable).map(String::as_str).unwrap_or(variable)
    }
}

/// Process name -> port -> wiring.
///
/// A port with no entry reads and writes a store named after the port.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    wiring: BTreeMap<String, BTreeMap<String, PortWiring>>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_defs(defs: &[WiringDef]) -> Self {
        let mut topology = Self::new();
        for def in defs {
            topology.wire(
                &def.process,
                &def.port,
                PortWiring::new(&def.store).with_rename(def.rename.clone()),
            );
        }
        topology
    }

    pub fn wire(&mut self, process: &str, port: &str, wiring: PortWiring) -> &mut Self {
        self.wiring
            .entry(process.to_string())
            .or_default()
            .insert(port.to_string(), wiring);
        self
    }

    pub fn resolve(&self, process: &str, port: &str) -> PortWiring {
        self.wiring
            .get(process)
            .and_then(|ports| ports.get(port))
            .cloned()
            .unwrap_or_else(|| PortWiring::new(port))
    }

    /// Explicitly wired (process, port) pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &PortWiring)> {
        self.wiring.iter().flat_map(|(process, ports)| {
            ports
                .iter()
                .map(move |(port, wiring)| (process.as_str(), port.as_str(), wiring))
        })
    }
}
