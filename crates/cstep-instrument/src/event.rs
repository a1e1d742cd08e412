//! Notify events and the per-pass registry.
//!
//! A [`NotifyData`] is one fact the instrumented program reports at run
//! time: a value was computed, a variable was declared or assigned, a
//! function was entered. Rules create events while they visit the tree;
//! the reference that the generated hook call passes back is assigned
//! later, when the shape holding the event is applied, so references
//! follow the order in which calls appear in the output.
//!
//! Events that fire together share one hook call and one reference:
//!
//! ```text
//! (notify_0(7), temp3 = a + b, notify_1(8, &temp3), temp3)
//!  ^ stat                      ^ eval
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use cstep_core::{SourceRange, Span};
use cstep_cst::NodeId;

use crate::error::InstrumentError;
use crate::options::InstrumentOptions;

/// What an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Assign,
    Decl,
    Eval,
    Invocation,
    Par,
    Return,
    Stat,
    Type,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Assign => "assign",
            Action::Decl => "decl",
            Action::Eval => "eval",
            Action::Invocation => "invocation",
            Action::Par => "par",
            Action::Return => "return",
            Action::Stat => "stat",
            Action::Type => "type",
        }
    }

    /// Events that carry a value pointer read from a generated temporary.
    fn reads_temporary(self) -> bool {
        matches!(self, Action::Eval | Action::Return | Action::Type)
    }

    /// Events that carry a pointer to a named program variable.
    fn reads_identifier(self) -> bool {
        matches!(self, Action::Assign | Action::Decl | Action::Par)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index of an event in its pass's [`NotifyRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(usize);

/// One instrumentation event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyData {
    /// Insertion order within the pass, from 1.
    pub id: u32,
    pub action: Action,
    /// The node the event is about; `None` for `type` events.
    pub node_id: Option<NodeId>,
    /// Reference of the hook call that emits this event, once applied.
    pub notify_id: Option<u32>,
    pub data_type: Option<String>,
    pub identifier: Option<String>,
    /// Enclosing block of a `decl` or `par`.
    pub scope: Option<Span>,
    /// Temporary holding the reported value, for `eval`, `return` and
    /// `type`.
    pub temp: Option<String>,
}

impl NotifyData {
    pub fn new(action: Action, node_id: Option<NodeId>) -> Self {
        NotifyData {
            id: 0,
            action,
            node_id,
            notify_id: None,
            data_type: None,
            identifier: None,
            scope: None,
            temp: None,
        }
    }

    pub fn with_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_scope(mut self, scope: Span) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_temp(mut self, temp: impl Into<String>) -> Self {
        self.temp = Some(temp.into());
        self
    }

    /// Pointer arguments this event adds to its hook call.
    pub fn parameters(&self) -> Result<Vec<String>, InstrumentError> {
        if self.action.reads_temporary() {
            let temp = self.require(self.temp.as_deref(), "temporary")?;
            Ok(vec![format!("&{}", temp)])
        } else if self.action.reads_identifier() {
            let identifier = self.require(self.identifier.as_deref(), "identifier")?;
            Ok(vec![format!("&{}", identifier)])
        } else {
            Ok(Vec::new())
        }
    }

    /// The metadata record, checking that every field the action needs
    /// is present.
    pub fn record(&self) -> Result<NotificationRecord, InstrumentError> {
        let notify_id = self.require(self.notify_id, "notifyId")?;
        let node_id = match self.action {
            Action::Type => None,
            _ => Some(self.require(self.node_id, "nodeId")?.0),
        };
        let data_type = match self.action {
            Action::Stat => None,
            _ => Some(self.require(self.data_type.clone(), "dataType")?),
        };
        let identifier = match self.action {
            Action::Assign | Action::Decl | Action::Invocation | Action::Par | Action::Type => {
                Some(self.require(self.identifier.clone(), "identifier")?)
            }
            _ => None,
        };
        let scope = match self.action {
            Action::Decl | Action::Par => Some(SourceRange::from(self.require(self.scope, "scope")?)),
            _ => None,
        };
        Ok(NotificationRecord {
            id: self.id,
            action: self.action,
            notify_id,
            node_id,
            data_type,
            scope,
            identifier,
        })
    }

    fn require<T>(&self, value: Option<T>, field: &'static str) -> Result<T, InstrumentError> {
        value.ok_or(InstrumentError::IncompleteEvent {
            id: self.id,
            action: self.action,
            field,
        })
    }
}

/// Serialized form of one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: u32,
    pub action: Action,
    pub notify_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<SourceRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

// ============================================================================
// Registry
// ============================================================================

/// The ordered events of one pass and its reference counter.
#[derive(Debug, Clone, Default)]
pub struct NotifyRegistry {
    events: Vec<NotifyData>,
    last_reference: u32,
}

impl NotifyRegistry {
    pub fn new() -> Self {
        NotifyRegistry::default()
    }

    /// Append an event, numbering it in insertion order.
    pub fn push(&mut self, mut data: NotifyData) -> EventId {
        let id = EventId(self.events.len());
        data.id = self.events.len() as u32 + 1;
        self.events.push(data);
        id
    }

    pub fn get(&self, id: EventId) -> &NotifyData {
        &self.events[id.0]
    }

    pub fn events(&self) -> &[NotifyData] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Give every event of `group` the next reference and return it.
    pub fn assign(&mut self, group: &[EventId]) -> u32 {
        self.last_reference += 1;
        for id in group {
            self.events[id.0].notify_id = Some(self.last_reference);
        }
        self.last_reference
    }

    /// Assign the next reference to `group` and render its hook call,
    /// `notify_N(ref, p1, .., pN)`.
    pub fn call(&mut self, group: &[EventId], options: &InstrumentOptions) -> Result<String, InstrumentError> {
        let mut parameters = Vec::new();
        for id in group {
            parameters.extend(self.get(*id).parameters()?);
        }
        if parameters.len() > options.max_notify_arity {
            return Err(InstrumentError::TooManyNotifyParameters {
                count: parameters.len(),
                max: options.max_notify_arity,
            });
        }
        let reference = self.assign(group);
        let arguments: Vec<String> = std::iter::once(reference.to_string()).chain(parameters).collect();
        Ok(format!("{}({})", options.hook(arguments.len() - 1), arguments.join(", ")))
    }

    /// Distinct data types of reported values and variables, in
    /// first-seen order.
    pub fn data_types(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for event in &self.events {
            if matches!(event.action, Action::Type | Action::Stat | Action::Invocation) {
                continue;
            }
            if let Some(data_type) = &event.data_type {
                if !seen.contains(data_type) {
                    seen.push(data_type.clone());
                }
            }
        }
        seen
    }

    /// Records of every event, ordered by reference then insertion.
    pub fn records(&self) -> Result<Vec<NotificationRecord>, InstrumentError> {
        let mut records = self
            .events
            .iter()
            .map(NotifyData::record)
            .collect::<Result<Vec<_>, _>>()?;
        records.sort_by_key(|r| (r.notify_id, r.id));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(node: u32, temp: &str) -> NotifyData {
        NotifyData::new(Action::Eval, Some(NodeId(node)))
            .with_type("int")
            .with_temp(temp)
    }

    mod calls {
        use super::*;

        #[test]
        fn grouped_events_share_one_reference() {
            let mut registry = NotifyRegistry::new();
            let stat = registry.push(NotifyData::new(Action::Stat, Some(NodeId(3))));
            let value = registry.push(eval(4, "temp0"));
            let call = registry.call(&[stat, value], &InstrumentOptions::default()).unwrap();
            assert_eq!(call, "notify_1(1, &temp0)");
            assert_eq!(registry.get(stat).notify_id, Some(1));
            assert_eq!(registry.get(value).notify_id, Some(1));
        }

        #[test]
        fn references_increase_per_call() {
            let mut registry = NotifyRegistry::new();
            let first = registry.push(eval(1, "temp0"));
            let second = registry.push(eval(2, "temp1"));
            let options = InstrumentOptions::default();
            assert_eq!(registry.call(&[second], &options).unwrap(), "notify_1(1, &temp1)");
            assert_eq!(registry.call(&[first], &options).unwrap(), "notify_1(2, &temp0)");
        }

        #[test]
        fn arity_above_the_maximum_fails() {
            let mut registry = NotifyRegistry::new();
            let group: Vec<_> = (0..3).map(|i| registry.push(eval(i, "t"))).collect();
            let options = InstrumentOptions {
                max_notify_arity: 2,
                ..InstrumentOptions::default()
            };
            let err = registry.call(&group, &options).unwrap_err();
            assert_eq!(err, InstrumentError::TooManyNotifyParameters { count: 3, max: 2 });
            assert!(registry.get(group[0]).notify_id.is_none());
        }

        #[test]
        fn identifier_events_point_at_the_variable() {
            let data = NotifyData::new(Action::Assign, Some(NodeId(9)))
                .with_type("int")
                .with_identifier("p->x");
            assert_eq!(data.parameters().unwrap(), vec!["&p->x".to_string()]);
        }
    }

    mod records {
        use super::*;

        #[test]
        fn unassigned_event_is_incomplete() {
            let mut registry = NotifyRegistry::new();
            registry.push(eval(1, "temp0"));
            let err = registry.records().unwrap_err();
            assert!(matches!(
                err,
                InstrumentError::IncompleteEvent {
                    field: "notifyId",
                    ..
                }
            ));
            assert!(err.is_contract_violation());
        }

        #[test]
        fn decl_needs_a_scope() {
            let mut data = NotifyData::new(Action::Decl, Some(NodeId(2)))
                .with_type("int")
                .with_identifier("a");
            data.notify_id = Some(1);
            assert!(matches!(
                data.record(),
                Err(InstrumentError::IncompleteEvent { field: "scope", .. })
            ));
        }

        #[test]
        fn serializes_only_the_fields_of_the_action() {
            let mut registry = NotifyRegistry::new();
            let stat = registry.push(NotifyData::new(Action::Stat, Some(NodeId(5))));
            let decl = registry.push(
                NotifyData::new(Action::Decl, Some(NodeId(6)))
                    .with_type("int")
                    .with_identifier("a")
                    .with_scope(Span::new(10, 40)),
            );
            registry.assign(&[decl]);
            registry.assign(&[stat]);
            let json = serde_json::to_value(registry.records().unwrap()).unwrap();
            assert_eq!(
                json,
                serde_json::json!([
                    {
                        "id": 2,
                        "action": "decl",
                        "notifyId": 1,
                        "nodeId": 6,
                        "dataType": "int",
                        "scope": {"startIndex": 10, "endIndex": 40},
                        "identifier": "a"
                    },
                    {"id": 1, "action": "stat", "notifyId": 2, "nodeId": 5}
                ])
            );
        }

        #[test]
        fn data_types_are_distinct_and_ordered() {
            let mut registry = NotifyRegistry::new();
            registry.push(eval(1, "t0"));
            registry.push(eval(2, "t1").with_type("double"));
            registry.push(eval(3, "t2"));
            registry.push(NotifyData::new(Action::Stat, Some(NodeId(4))));
            assert_eq!(registry.data_types(), vec!["int".to_string(), "double".to_string()]);
        }
    }
}
