use super::distribution::group_value;
use super::group::GroupValue;
use super::jsonl::{self, FieldSpec, FieldType, Header};
use super::tsv;
use super::ColumnAttrs;
use crate::error::Result;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::Write;

pub const PAIRWISE_DOCTYPE: &str = "pairwise-stats";

/// Column order of a pairwise statistics table.
pub const COLUMNS: [&str; 10] = [
    "A:group",
    "A:n",
    "A:measure",
    "B:group",
    "B:n",
    "B:measure",
    "n",
    "test-statistic",
    "p-value",
    "q-value",
];

/// One comparison between group A and group B.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseRow {
    pub a_group: GroupValue,
    pub a_n: usize,
    pub a_measure: f64,
    pub b_group: GroupValue,
    pub b_n: usize,
    pub b_measure: f64,
    pub n: usize,
    pub test_statistic: f64,
    pub p_value: f64,
    pub q_value: f64,
}

impl PairwiseRow {
    fn cell(&self, column: &str) -> Value {
        match column {
            "A:group" => group_value(&self.a_group),
            "A:n" => Value::from(self.a_n),
            "A:measure" => jsonl::number(self.a_measure),
            "B:group" => group_value(&self.b_group),
            "B:n" => Value::from(self.b_n),
            "B:measure" => jsonl::number(self.b_measure),
            "n" => Value::from(self.n),
            "test-statistic" => jsonl::number(self.test_statistic),
            "p-value" => jsonl::number(self.p_value),
            "q-value" => jsonl::number(self.q_value),
            _ => Value::Null,
        }
    }

    fn text_cell(&self, column: &str) -> String {
        match column {
            "A:group" => self.a_group.to_string(),
            "A:n" => self.a_n.to_string(),
            "A:measure" => self.a_measure.to_string(),
            "B:group" => self.b_group.to_string(),
            "B:n" => self.b_n.to_string(),
            "B:measure" => self.b_measure.to_string(),
            "n" => self.n.to_string(),
            "test-statistic" => self.test_statistic.to_string(),
            "p-value" => self.p_value.to_string(),
            "q-value" => self.q_value.to_string(),
            _ => String::new(),
        }
    }

    fn float(&self, column: &str) -> f64 {
        match column {
            "A:measure" => self.a_measure,
            "B:measure" => self.b_measure,
            "test-statistic" => self.test_statistic,
            "p-value" => self.p_value,
            "q-value" => self.q_value,
            _ => 0.0,
        }
    }
}

/// Table of pairwise comparisons with per-column titles and descriptions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsTable {
    pub rows: Vec<PairwiseRow>,
    pub attrs: BTreeMap<String, ColumnAttrs>,
}

impl StatsTable {
    pub fn new(rows: Vec<PairwiseRow>) -> Self {
        StatsTable {
            rows,
            attrs: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_attrs(&self, column: &str) -> ColumnAttrs {
        self.attrs.get(column).cloned().unwrap_or_default()
    }

    pub fn set_attrs(&mut self, column: &str, title: impl Into<String>, description: impl Into<String>) {
        self.attrs.insert(
            column.to_string(),
            ColumnAttrs {
                title: Some(title.into()),
                description: Some(description.into()),
            },
        );
    }

    fn header(&self) -> Header {
        let fields = COLUMNS
            .iter()
            .map(|&name| {
                let field_type = match name {
                    "A:group" | "B:group" => self.group_type(name),
                    "A:n" | "B:n" | "n" => FieldType::Integer,
                    _ => FieldType::Number,
                };
                let attrs = self.column_attrs(name);
                FieldSpec {
                    missing: field_type == FieldType::Number
                        && self.rows.iter().any(|r| r.float(name).is_nan()),
                    title: attrs.title,
                    description: attrs.description,
                    ..FieldSpec::new(name, field_type)
                }
            })
            .collect();
        Header::new(PAIRWISE_DOCTYPE, fields)
    }

    fn group_type(&self, column: &str) -> FieldType {
        let numeric = self.rows.iter().all(|r| match column {
            "A:group" => r.a_group.is_number(),
            _ => r.b_group.is_number(),
        });
        if numeric {
            FieldType::Number
        } else {
            FieldType::String
        }
    }

    pub fn to_jsonl<W: Write>(&self, writer: &mut W) -> Result<()> {
        let records: Vec<Map<String, Value>> = self
            .rows
            .iter()
            .map(|row| {
                COLUMNS
                    .iter()
                    .map(|&c| (c.to_string(), row.cell(c)))
                    .collect()
            })
            .collect();
        jsonl::write(writer, &self.header(), &records)
    }

    pub fn to_tsv<W: Write>(&self, writer: &mut W) -> Result<()> {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| COLUMNS.iter().map(|&c| row.text_cell(c)).collect())
            .collect();
        tsv::write(writer, &COLUMNS, &rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> StatsTable {
        let mut table = StatsTable::new(vec![
            PairwiseRow {
                a_group: GroupValue::from("a"),
                a_n: 3,
                a_measure: 2.0,
                b_group: GroupValue::from("b"),
                b_n: 4,
                b_measure: 5.5,
                n: 7,
                test_statistic: 1.0,
                p_value: 0.1,
                q_value: 0.2,
            },
            PairwiseRow {
                a_group: GroupValue::from("a"),
                a_n: 3,
                a_measure: 2.0,
                b_group: GroupValue::from("c"),
                b_n: 0,
                b_measure: f64::NAN,
                n: 0,
                test_statistic: f64::NAN,
                p_value: f64::NAN,
                q_value: f64::NAN,
            },
        ]);
        table.set_attrs("p-value", "p-value", "two-sided, auto");
        table
    }

    #[test]
    fn test_jsonl_output() {
        let mut out = Vec::new();
        table().to_jsonl(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);

        let header = &lines[0];
        assert_eq!(header["doctype"]["name"], PAIRWISE_DOCTYPE);
        let names: Vec<&str> = header["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, COLUMNS.to_vec());
        assert_eq!(header["fields"][1]["type"], "integer");
        assert_eq!(header["fields"][8]["missing"], true);
        assert_eq!(header["fields"][8]["description"], "two-sided, auto");

        assert_eq!(lines[1]["B:group"], "b");
        assert_eq!(lines[1]["A:n"], 3);
        assert_eq!(lines[2]["p-value"], Value::Null);
    }

    #[test]
    fn test_tsv_output() {
        let mut out = Vec::new();
        table().to_tsv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), COLUMNS.join("\t"));
        assert_eq!(lines.next().unwrap(), "a\t3\t2\tb\t4\t5.5\t7\t1\t0.1\t0.2");
        assert_eq!(lines.next().unwrap(), "a\t3\t2\tc\t0\tNaN\t0\tNaN\tNaN\tNaN");
    }
}
