use super::group::GroupValue;
use super::jsonl::{self, FieldSpec, FieldType, Header};
use super::tsv;
use super::ColumnAttrs;
use crate::error::{Result, StatsError};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::{BufRead, Write};

pub const DIST1D_DOCTYPE: &str = "dist1d";

#[derive(Debug, Clone, PartialEq)]
pub struct DistRow {
    pub id: String,
    pub subject: Option<String>,
    pub group: GroupValue,
    /// NaN when missing.
    pub measure: f64,
}

/// One-dimensional distribution of measures, labelled by group and
/// optionally by subject.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distribution {
    pub rows: Vec<DistRow>,
    pub attrs: BTreeMap<String, ColumnAttrs>,
}

impl Distribution {
    pub fn new(rows: Vec<DistRow>) -> Self {
        Distribution {
            rows,
            attrs: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct groups in sorted order.
    pub fn groups(&self) -> Vec<GroupValue> {
        self.rows
            .iter()
            .map(|r| r.group.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn has_subjects(&self) -> bool {
        self.rows.iter().any(|r| r.subject.is_some())
    }

    /// Measures of one group, in row order.
    pub fn measures(&self, group: &GroupValue) -> Vec<f64> {
        self.rows
            .iter()
            .filter(|r| &r.group == group)
            .map(|r| r.measure)
            .collect()
    }

    /// `(subject, measure)` pairs of one group, in row order.
    ///
    /// Every row needs a subject and a subject may appear only once per group.
    pub fn subject_measures(&self, group: &GroupValue) -> Result<Vec<(String, f64)>> {
        let mut seen = HashSet::new();
        let mut pairs = Vec::new();
        for row in self.rows.iter().filter(|r| &r.group == group) {
            let subject = row
                .subject
                .as_ref()
                .ok_or_else(|| StatsError::MissingColumn("subject".to_string()))?;
            if !seen.insert(subject.as_str()) {
                return Err(StatsError::DuplicateSubject {
                    group: group.to_string(),
                    subject: subject.clone(),
                });
            }
            pairs.push((subject.clone(), row.measure));
        }
        Ok(pairs)
    }

    /// Find the group a user-supplied value refers to.
    ///
    /// An exact label match wins; otherwise the value is parsed as a number
    /// and compared against numeric groups.
    pub fn resolve_group(&self, raw: &str) -> Result<GroupValue> {
        let groups = self.groups();
        if let Some(found) = groups.iter().find(|g| g.matches_text(raw)) {
            return Ok(found.clone());
        }
        if let Ok(value) = raw.trim().parse::<f64>() {
            if let Some(found) = groups.iter().find(|g| g.matches_number(value)) {
                return Ok(found.clone());
            }
        }
        Err(StatsError::GroupNotFound(raw.to_string()))
    }

    pub fn column_attrs(&self, column: &str) -> ColumnAttrs {
        self.attrs.get(column).cloned().unwrap_or_default()
    }

    fn groups_are_numeric(&self) -> bool {
        self.rows.iter().all(|r| r.group.is_number())
    }

    pub fn from_jsonl<R: BufRead>(reader: R) -> Result<Self> {
        let (header, records) = jsonl::read(reader)?;
        if header.doctype.name != DIST1D_DOCTYPE {
            tracing::warn!(
                "reading '{}' document as a distribution",
                header.doctype.name
            );
        }
        for required in ["id", "group", "measure"] {
            if header.field(required).is_none() {
                return Err(StatsError::MissingColumn(required.to_string()));
            }
        }

        let mut rows = Vec::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            // header is line 1
            let line = idx + 2;
            rows.push(row_from_record(record, line)?);
        }

        let attrs = header
            .fields
            .into_iter()
            .map(|f| {
                (
                    f.name,
                    ColumnAttrs {
                        title: f.title,
                        description: f.description,
                    },
                )
            })
            .collect();
        Ok(Distribution { rows, attrs })
    }

    pub fn from_tsv<R: BufRead>(reader: R) -> Result<Self> {
        let table = tsv::read(reader)?;
        let id_col = table.require_column("id")?;
        let group_col = table.require_column("group")?;
        let measure_col = table.require_column("measure")?;
        let subject_col = table.column_index("subject");

        let numeric_groups = table
            .rows
            .iter()
            .all(|r| r[group_col].parse::<f64>().is_ok());

        let mut rows = Vec::with_capacity(table.rows.len());
        for (idx, cells) in table.rows.iter().enumerate() {
            let raw_group = &cells[group_col];
            let group = match raw_group.parse::<f64>() {
                Ok(n) if numeric_groups => GroupValue::Number(n),
                _ => GroupValue::Text(raw_group.clone()),
            };
            let measure = parse_measure(&cells[measure_col]).ok_or_else(|| {
                StatsError::TableParse {
                    format: "TSV",
                    line: idx + 2,
                    message: format!("measure '{}' is not a number", cells[measure_col]),
                }
            })?;
            let subject = subject_col
                .map(|c| cells[c].clone())
                .filter(|s| !s.is_empty());

            rows.push(DistRow {
                id: cells[id_col].clone(),
                subject,
                group,
                measure,
            });
        }
        Ok(Distribution::new(rows))
    }

    fn header(&self) -> Header {
        let group_type = if self.groups_are_numeric() {
            FieldType::Number
        } else {
            FieldType::String
        };
        let mut columns = vec![("id", FieldType::String)];
        if self.has_subjects() {
            columns.push(("subject", FieldType::String));
        }
        columns.push(("group", group_type));
        columns.push(("measure", FieldType::Number));

        let fields = columns
            .into_iter()
            .map(|(name, ty)| {
                let attrs = self.column_attrs(name);
                FieldSpec {
                    missing: name == "measure" && self.rows.iter().any(|r| r.measure.is_nan()),
                    title: attrs.title,
                    description: attrs.description,
                    ..FieldSpec::new(name, ty)
                }
            })
            .collect();
        Header::new(DIST1D_DOCTYPE, fields)
    }

    pub fn to_jsonl<W: Write>(&self, writer: &mut W) -> Result<()> {
        let with_subject = self.has_subjects();
        let records: Vec<Map<String, Value>> = self
            .rows
            .iter()
            .map(|row| {
                let mut record = Map::new();
                record.insert("id".to_string(), Value::String(row.id.clone()));
                if with_subject {
                    record.insert(
                        "subject".to_string(),
                        row.subject.clone().map_or(Value::Null, Value::String),
                    );
                }
                record.insert("group".to_string(), group_value(&row.group));
                record.insert("measure".to_string(), jsonl::number(row.measure));
                record
            })
            .collect();
        jsonl::write(writer, &self.header(), &records)
    }

    pub fn to_tsv<W: Write>(&self, writer: &mut W) -> Result<()> {
        let with_subject = self.has_subjects();
        let mut columns = vec!["id"];
        if with_subject {
            columns.push("subject");
        }
        columns.extend(["group", "measure"]);

        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                let mut cells = vec![row.id.clone()];
                if with_subject {
                    cells.push(row.subject.clone().unwrap_or_default());
                }
                cells.push(row.group.to_string());
                cells.push(row.measure.to_string());
                cells
            })
            .collect();
        tsv::write(writer, &columns, &rows)
    }
}

fn parse_measure(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return Some(f64::NAN);
    }
    raw.parse::<f64>().ok()
}

pub(crate) fn group_value(group: &GroupValue) -> Value {
    match group {
        GroupValue::Number(n) => jsonl::number(*n),
        GroupValue::Text(s) => Value::String(s.clone()),
    }
}

fn row_from_record(record: &Map<String, Value>, line: usize) -> Result<DistRow> {
    let bad = |message: String| StatsError::TableParse {
        format: "JSONL",
        line,
        message,
    };

    let id = match record.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        other => return Err(bad(format!("invalid id {:?}", other))),
    };
    let subject = match record.get("subject") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => return Err(bad(format!("invalid subject {}", other))),
    };
    let group = match record.get("group") {
        Some(Value::String(s)) => GroupValue::Text(s.clone()),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) => GroupValue::Number(v),
            None => return Err(bad(format!("invalid group {}", n))),
        },
        other => return Err(bad(format!("invalid group {:?}", other))),
    };
    let measure = match record.get("measure") {
        None | Some(Value::Null) => f64::NAN,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(other) => return Err(bad(format!("invalid measure {}", other))),
    };

    Ok(DistRow {
        id,
        subject,
        group,
        measure,
    })
}
