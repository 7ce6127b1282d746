use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate};
use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{RenderError, ReportError};

// ============================================================================
// Layout document
// ============================================================================

/// Designer layout. Styles, document properties and version must be present
/// with the right shape but do not affect the output.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Layout {
    pub doc_elements: Vec<DocElement>,
    #[serde(rename = "styles")]
    _styles: Vec<IgnoredAny>,
    pub parameters: Vec<Parameter>,
    #[serde(rename = "documentProperties")]
    _document_properties: HashMap<String, IgnoredAny>,
    #[serde(rename = "version")]
    _version: IgnoredAny,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Parameter {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub children: Vec<Parameter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DocElement {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub element_type: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub data_source: String,
    #[serde(default)]
    pub header_data: Option<TableBand>,
    #[serde(default)]
    pub content_data_rows: Vec<TableBand>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TableBand {
    #[serde(default)]
    pub column_data: Vec<TableCell>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TableCell {
    #[serde(default)]
    pub content: String,
}

const TEXT: &str = "text";
const TABLE: &str = "table";
const ARRAY: &str = "array";

impl Layout {
    pub fn parse(layout: &Value) -> Result<Self, RenderError> {
        if !layout.is_object() {
            return Err(RenderError::Init(
                "report definition must be an object".to_string(),
            ));
        }
        Layout::deserialize(layout)
            .map_err(|e| RenderError::Init(format!("invalid report definition: {e}")))
    }

    fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Collect every structural error in the layout and, for designer test
    /// data, every value that does not match its parameter type.
    pub fn validate(&self, data: &Map<String, Value>, is_test_data: bool) -> Vec<ReportError> {
        let mut errors = Vec::new();

        let mut seen = HashSet::new();
        for parameter in &self.parameters {
            if parameter.name.trim().is_empty() {
                errors.push(ReportError::new(
                    "errorMsgMissingParameterName",
                    parameter.id,
                    "name",
                ));
            } else if !seen.insert(parameter.name.as_str()) {
                errors.push(
                    ReportError::new("errorMsgDuplicateParameter", parameter.id, "name")
                        .with_info(parameter.name.clone()),
                );
            }
        }

        for element in &self.doc_elements {
            match element.element_type.as_str() {
                TEXT => {
                    for name in expressions(&element.content) {
                        if self.parameter(name).is_none() {
                            errors.push(
                                ReportError::new(
                                    "errorMsgInvalidExpressionNameNotDefined",
                                    element.id,
                                    "content",
                                )
                                .with_info(name.to_string()),
                            );
                        }
                    }
                }
                TABLE => self.validate_table(element, &mut errors),
                _ => {}
            }
        }

        if is_test_data {
            for parameter in &self.parameters {
                if parameter.kind != "number" {
                    continue;
                }
                if let Some(Value::String(raw)) = data.get(&parameter.name) {
                    if !raw.trim().is_empty() && raw.trim().parse::<f64>().is_err() {
                        errors.push(
                            ReportError::new("errorMsgInvalidNumber", parameter.id, "test_data")
                                .with_info(raw.clone()),
                        );
                    }
                }
            }
        }

        errors
    }

    fn validate_table(&self, element: &DocElement, errors: &mut Vec<ReportError>) {
        if element.data_source.trim().is_empty() {
            return;
        }
        let source = expressions(&element.data_source)
            .next()
            .and_then(|name| self.parameter(name))
            .filter(|p| p.kind == ARRAY);
        let Some(source) = source else {
            errors.push(
                ReportError::new(
                    "errorMsgInvalidDataSourceParameter",
                    element.id,
                    "dataSource",
                )
                .with_info(element.data_source.clone()),
            );
            return;
        };

        if source.children.is_empty() {
            return;
        }
        for row in &element.content_data_rows {
            for cell in &row.column_data {
                for name in expressions(&cell.content) {
                    let known = source.children.iter().any(|c| c.name == name)
                        || self.parameter(name).is_some();
                    if !known {
                        errors.push(
                            ReportError::new(
                                "errorMsgInvalidExpressionNameNotDefined",
                                element.id,
                                "content",
                            )
                            .with_info(name.to_string()),
                        );
                    }
                }
            }
        }
    }

    /// Fill the layout with data, in reading order.
    pub fn evaluate(&self, data: &Map<String, Value>) -> Result<Document, RenderError> {
        let mut elements: Vec<&DocElement> = self
            .doc_elements
            .iter()
            .filter(|e| e.element_type == TEXT || e.element_type == TABLE)
            .collect();
        elements.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

        let scope = Scope {
            layout: self,
            data,
            item: None,
            item_types: HashMap::new(),
        };

        let mut blocks = Vec::new();
        for element in elements {
            if element.element_type == TEXT {
                blocks.push(Block::Text(scope.substitute(&element.content)));
            } else {
                blocks.push(self.evaluate_table(element, &scope)?);
            }
        }

        Ok(Document { blocks })
    }

    fn evaluate_table(&self, element: &DocElement, scope: &Scope<'_>) -> Result<Block, RenderError> {
        let header = element
            .header_data
            .as_ref()
            .map(|band| {
                band.column_data
                    .iter()
                    .map(|cell| scope.substitute(&cell.content))
                    .collect()
            })
            .unwrap_or_default();

        let mut rows = Vec::new();
        let source_name = expressions(&element.data_source).next();
        if let Some(name) = source_name {
            let items = match scope.data.get(name) {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(items)) => items.iter().collect(),
                Some(_) => {
                    return Err(RenderError::Report(
                        ReportError::new("errorMsgInvalidArray", element.id, "dataSource")
                            .with_info(name.to_string()),
                    ))
                }
            };

            let item_types: HashMap<&str, &str> = self
                .parameter(name)
                .map(|p| {
                    p.children
                        .iter()
                        .map(|c| (c.name.as_str(), c.kind.as_str()))
                        .collect()
                })
                .unwrap_or_default();

            if let Some(band) = element.content_data_rows.first() {
                for item in items {
                    let row_scope = Scope {
                        layout: self,
                        data: scope.data,
                        item: item.as_object(),
                        item_types: item_types.clone(),
                    };
                    rows.push(
                        band.column_data
                            .iter()
                            .map(|cell| row_scope.substitute(&cell.content))
                            .collect(),
                    );
                }
            }
        }

        Ok(Block::Table { header, rows })
    }
}

// ============================================================================
// Evaluated document
// ============================================================================

/// A report with all expressions replaced by values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text(String),
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

struct Scope<'a> {
    layout: &'a Layout,
    data: &'a Map<String, Value>,
    item: Option<&'a Map<String, Value>>,
    item_types: HashMap<&'a str, &'a str>,
}

impl Scope<'_> {
    fn lookup(&self, name: &str) -> String {
        if let Some(value) = self.item.and_then(|item| item.get(name)) {
            return format_value(value, self.item_types.get(name).copied());
        }
        match self.data.get(name) {
            Some(value) => format_value(value, self.layout.parameter(name).map(|p| p.kind.as_str())),
            None => String::new(),
        }
    }

    fn substitute(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("${") {
            let Some(len) = rest[start + 2..].find('}') else {
                break;
            };
            out.push_str(&rest[..start]);
            out.push_str(&self.lookup(rest[start + 2..start + 2 + len].trim()));
            rest = &rest[start + 3 + len..];
        }
        out.push_str(rest);
        out
    }
}

/// Names referenced as `${name}` in a template.
pub(crate) fn expressions(template: &str) -> impl Iterator<Item = &str> {
    template.split("${").skip(1).filter_map(|part| {
        part.find('}')
            .map(|end| part[..end].trim())
            .filter(|name| !name.is_empty())
    })
}

fn format_value(value: &Value, kind: Option<&str>) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if kind == Some("date") => format_date(s),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn format_date(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expressions() {
        let names: Vec<&str> = expressions("Albums ${year} by ${ artist } ${}").collect();
        assert_eq!(names, vec!["year", "artist"]);
    }

    #[test]
    fn test_layout_members_must_have_their_shape() {
        let valid = serde_json::json!({
            "docElements": [], "styles": [{"id": 1}], "parameters": [],
            "documentProperties": {"pageFormat": "A4"}, "version": null
        });
        assert!(Layout::parse(&valid).is_ok());

        for (member, value) in [
            ("styles", serde_json::json!({})),
            ("documentProperties", serde_json::json!([])),
        ] {
            let mut layout = valid.clone();
            layout[member] = value;
            assert!(
                matches!(Layout::parse(&layout), Err(RenderError::Init(_))),
                "{member}"
            );
        }

        let mut layout = valid;
        layout.as_object_mut().unwrap().remove("version");
        assert!(matches!(Layout::parse(&layout), Err(RenderError::Init(_))));
    }

    #[test]
    fn test_unterminated_expression_is_literal() {
        let layout = Layout::parse(&serde_json::json!({
            "docElements": [], "styles": [], "parameters": [],
            "documentProperties": {}, "version": 1
        }))
        .unwrap();
        let data = Map::new();
        let scope = Scope {
            layout: &layout,
            data: &data,
            item: None,
            item_types: HashMap::new(),
        };
        assert_eq!(scope.substitute("price ${amount"), "price ${amount");
    }

    #[test]
    fn test_format_values() {
        assert_eq!(format_value(&Value::Null, None), "");
        assert_eq!(format_value(&Value::Bool(true), None), "yes");
        assert_eq!(format_value(&serde_json::json!(1999), None), "1999");
        assert_eq!(
            format_value(&serde_json::json!("2024-03-01T10:00:00+00:00"), Some("date")),
            "2024-03-01"
        );
        assert_eq!(format_value(&serde_json::json!("n/a"), Some("date")), "n/a");
    }
}
