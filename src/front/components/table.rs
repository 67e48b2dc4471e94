use anyhow::anyhow;
use serde::Serialize;
use serde_json::Value;

/// Fields never shown in a table: surrogate keys and raw user references.
const HIDDEN_COLUMNS: &[&str] = &["id", "user_id", "requested_by", "approved_by"];
const AMOUNT_COLUMNS: &[&str] = &["amount", "balance", "debit", "credit"];

#[derive(Serialize, Debug, PartialEq)]
pub struct Column {
    key: String,
    label: String,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct Cell {
    value: String,
    is_amount: bool,
    is_status: bool,
}

/// Column/row view of any list of serializable records. Columns follow the
/// record's field order.
#[derive(Serialize, Default, Debug)]
pub struct TableComponent {
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
    is_empty: bool,
}

impl TableComponent {
    pub fn new<T: Serialize + Default>(entries: &[T]) -> anyhow::Result<Self> {
        let keys: Vec<String> = get_struct_fields_names(T::default())?
            .into_iter()
            .filter(|k| !HIDDEN_COLUMNS.contains(&k.as_str()))
            .collect();

        let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(entries.len());
        for entry in entries {
            let j = serde_json::to_value(entry)?;
            let j = j.as_object().ok_or(anyhow!("table rows must be objects"))?;
            rows.push(
                keys.iter()
                    .map(|k| Cell {
                        value: cell_text(j.get(k).unwrap_or(&Value::Null)),
                        is_amount: AMOUNT_COLUMNS.contains(&k.as_str()),
                        is_status: k == "status",
                    })
                    .collect(),
            );
        }

        Ok(Self {
            columns: keys
                .into_iter()
                .map(|key| Column {
                    label: column_label(&key),
                    key,
                })
                .collect(),
            is_empty: rows.is_empty(),
            rows,
        })
    }
}

fn get_struct_fields_names(s: impl Serialize) -> anyhow::Result<Vec<String>> {
    let j = serde_json::to_value(s)?;
    let j = j.as_object().ok_or(anyhow!("it should be an object"))?;
    Ok(j.iter().map(|f| f.0).cloned().collect())
}

fn cell_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `date_requested` -> `Date Requested`.
fn column_label(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
