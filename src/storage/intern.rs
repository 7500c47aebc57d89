// src/storage/intern.rs

//! String interning for repeated names.

use std::collections::HashMap;
use std::sync::Mutex;

use super::schema::Table;
use super::writer::Record;

#[derive(Debug, Default)]
struct Names {
    ids: HashMap<String, i64>,
    order: Vec<String>,
}

/// Maps each distinct name to one stable id for the lifetime of a capture.
///
/// Lookup and assignment happen under one lock, so concurrent producers
/// never hand out two ids for the same name.
#[derive(Debug)]
pub struct Interner {
    table: Table,
    names: Mutex<Names>,
}

impl Interner {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            names: Mutex::new(Names::default()),
        }
    }

    pub fn table(&self) -> Table {
        self.table
    }

    /// Id of `name`, assigning the next one on first sight. Ids start at 1.
    pub fn id(&self, name: &str) -> i64 {
        let mut names = self.names.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(id) = names.ids.get(name) {
            return *id;
        }
        names.order.push(name.to_string());
        let id = names.order.len() as i64;
        names.ids.insert(name.to_string(), id);
        id
    }

    pub fn len(&self) -> usize {
        self.names.lock().unwrap_or_else(|e| e.into_inner()).order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name rows in id order, ready for the writer.
    pub fn records(&self) -> Vec<Record> {
        let names = self.names.lock().unwrap_or_else(|e| e.into_inner());
        names
            .order
            .iter()
            .enumerate()
            .map(|(idx, name)| Record::Name {
                table: self.table,
                id: idx as i64 + 1,
                name: name.clone(),
            })
            .collect()
    }
}
