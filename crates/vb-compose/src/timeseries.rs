//! Recorded values of emitted variables.

use std::collections::BTreeMap;
use std::io::Write;

use serde::{Deserialize, Serialize};
use vb_core::Real;

use crate::error::ComposeResult;
use crate::store::Stores;

/// One column per emitted store variable, named `store.variable`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeseries {
    pub times: Vec<Real>,
    pub columns: BTreeMap<String, Vec<Real>>,
    #[serde(skip)]
    sources: Vec<(String, String)>,
}

impl Timeseries {
    pub fn new<I>(sources: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut sources: Vec<(String, String)> = sources.into_iter().collect();
        sources.sort();
        sources.dedup();
        let columns = sources
            .iter()
            .map(|(store, variable)| (column_name(store, variable), Vec::new()))
            .collect();
        Self {
            times: Vec::new(),
            columns,
            sources,
        }
    }

    pub fn record(&mut self, time: Real, stores: &Stores) {
        self.times.push(time);
        for (store, variable) in &self.sources {
            let value = stores.value(store, variable).unwrap_or(Real::NAN);
            self.columns
                .entry(column_name(store, variable))
                .or_default()
                .push(value);
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn series(&self, store: &str, variable: &str) -> Option<&[Real]> {
        self.columns
            .get(&column_name(store, variable))
            .map(Vec::as_slice)
    }

    pub fn last(&self, store: &str, variable: &str) -> Option<Real> {
        self.series(store, variable).and_then(|s| s.last().copied())
    }

    pub fn write_csv<W: Write>(&self, mut out: W) -> ComposeResult<()> {
        let mut header = String::from("time");
        for name in self.columns.keys() {
            header.push(',');
            header.push_str(name);
        }
        writeln!(out, "{header}")?;

        for (row, time) in self.times.iter().enumerate() {
            let mut line = time.to_string();
            for values in self.columns.values() {
                line.push(',');
                if let Some(value) = values.get(row) {
                    line.push_str(&value.to_string());
                }
            }
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    pub fn write_json<W: Write>(&self, out: W) -> ComposeResult<()> {
        serde_json::to_writer_pretty(out, self)?;
        Ok(())
    }
}

fn column_name(store: &str, variable: &str) -> String {
    format!("{store}.{variable}")
}
