//! Condition-database XML for alignment records.
//!
//! The layout (including the double spaces and the blank indented line after
//! each condition) is what the reconstruction's condition loader has been
//! fed historically, so it is reproduced verbatim. Computed values are
//! written as doubles (shortest round-trip decimals, `0.0` for zero,
//! two-digit exponents in scientific form); entries that are zero by
//! construction are written as the integer `0`.

use super::builder::{AlignmentConditions, PerturbationRecord, RecordKind};
use crate::error::ConditionParseError;
use crate::io::write_text_file;
use std::path::Path;

const HEADER: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n",
    "<!DOCTYPE DDDB SYSTEM \"../../../DTD/structure.dtd\">\n",
    "<DDDB>\n",
    "\n",
);

const FOOTER: &str = "</DDDB>\n";

/// Renders the `VPSystem`/`VPLeft`/`VPRight` document.
pub fn render_global_xml(conditions: &AlignmentConditions) -> String {
    render_document(&conditions.global)
}

/// Renders the per-module document.
pub fn render_modules_xml(conditions: &AlignmentConditions) -> String {
    render_document(&conditions.modules)
}

/// Writes the global and module documents, creating parent directories.
pub fn write_condition_files(
    conditions: &AlignmentConditions,
    global_path: &Path,
    modules_path: &Path,
) -> Result<(), String> {
    for (path, body) in [
        (global_path, render_global_xml(conditions)),
        (modules_path, render_modules_xml(conditions)),
    ] {
        write_text_file(path, &body)?;
    }
    Ok(())
}

fn render_document(records: &[PerturbationRecord]) -> String {
    let mut xml = String::from(HEADER);
    for record in records {
        render_condition(&mut xml, record);
    }
    xml.push_str(FOOTER);
    xml
}

fn render_condition(out: &mut String, record: &PerturbationRecord) {
    let ([tx, ty, tz], [rx, ry, rz]) = match record.kind {
        RecordKind::Fixed => (
            record.translation.map(format_literal),
            record.rotation.map(format_literal),
        ),
        RecordKind::Tilted => {
            let [tx, ty, tz] = record.translation;
            let [rx, ry, rz] = record.rotation;
            (
                [format_double(tx), format_literal(ty), format_double(tz)],
                [format_double(rx), format_double(ry), format_literal(rz)],
            )
        }
    };
    out.push_str(&format!(
        "  <condition classID=\"{}\"  name=\"{}\">\n",
        record.class_id, record.element_id
    ));
    out.push_str(&format!(
        "    <paramVector  name=\"dPosXYZ\"  type=\"double\"> {tx} {ty} {tz} </paramVector>\n"
    ));
    out.push_str(&format!(
        "    <paramVector  name=\"dRotXYZ\"  type=\"double\"> {rx} {ry} {rz} </paramVector>\n"
    ));
    out.push_str("  </condition>\n");
    out.push_str("  \n");
}

/// Integer zero for entries that are never computed.
fn format_literal(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        format_double(value)
    }
}

/// Formats a double like the generator's `str.format` did.
pub(crate) fn format_double(value: f64) -> String {
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = value.abs();
    if !(1e-4..1e16).contains(&magnitude) {
        let sci = format!("{value:e}");
        return match sci.split_once('e') {
            Some((mantissa, exponent)) => {
                let exp: i32 = exponent.parse().unwrap_or(0);
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exp.abs())
            }
            None => sci,
        };
    }
    let plain = format!("{value}");
    if plain.contains('.') {
        plain
    } else {
        format!("{plain}.0")
    }
}

/// Parses a condition document back into records, in document order.
pub fn parse_conditions(xml: &str) -> Result<Vec<PerturbationRecord>, ConditionParseError> {
    let mut records = Vec::new();
    let mut current: Option<PartialCondition> = None;

    for (idx, raw) in xml.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.starts_with("<condition") {
            if current.is_some() {
                return Err(malformed(line_no, "nested <condition>"));
            }
            let class_id = attribute(line, "classID")
                .ok_or_else(|| malformed(line_no, "missing classID"))?
                .parse::<u32>()
                .map_err(|e| malformed(line_no, &format!("bad classID: {e}")))?;
            let name = attribute(line, "name").ok_or_else(|| malformed(line_no, "missing name"))?;
            current = Some(PartialCondition {
                name: name.to_string(),
                class_id,
                kind: RecordKind::Fixed,
                translation: None,
                rotation: None,
            });
        } else if line.starts_with("<paramVector") {
            let cond = current
                .as_mut()
                .ok_or_else(|| malformed(line_no, "paramVector outside condition"))?;
            let name = attribute(line, "name").ok_or_else(|| malformed(line_no, "missing name"))?;
            let (values, all_literal) = vector_values(line).map_err(|m| malformed(line_no, &m))?;
            match name {
                "dPosXYZ" => cond.translation = Some(values),
                "dRotXYZ" => {
                    cond.rotation = Some(values);
                    cond.kind = if all_literal {
                        RecordKind::Fixed
                    } else {
                        RecordKind::Tilted
                    };
                }
                other => return Err(malformed(line_no, &format!("unknown paramVector {other}"))),
            }
        } else if line.starts_with("</condition>") {
            let cond = current
                .take()
                .ok_or_else(|| malformed(line_no, "unbalanced </condition>"))?;
            records.push(cond.finish()?);
        }
    }

    if let Some(cond) = current {
        return Err(ConditionParseError::Incomplete(cond.name));
    }
    Ok(records)
}

struct PartialCondition {
    name: String,
    class_id: u32,
    kind: RecordKind,
    translation: Option<[f64; 3]>,
    rotation: Option<[f64; 3]>,
}

impl PartialCondition {
    fn finish(self) -> Result<PerturbationRecord, ConditionParseError> {
        match (self.translation, self.rotation) {
            (Some(translation), Some(rotation)) => Ok(PerturbationRecord {
                element_id: self.name,
                class_id: self.class_id,
                kind: self.kind,
                translation,
                rotation,
            }),
            _ => Err(ConditionParseError::Incomplete(self.name)),
        }
    }
}

fn malformed(line: usize, message: &str) -> ConditionParseError {
    ConditionParseError::Malformed {
        line,
        message: message.to_string(),
    }
}

fn attribute<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("{key}=\"");
    let start = line.find(&needle)? + needle.len();
    let len = line[start..].find('"')?;
    Some(&line[start..start + len])
}

/// Values of a `paramVector` line and whether every token was an integer.
fn vector_values(line: &str) -> Result<([f64; 3], bool), String> {
    let open = line.find('>').ok_or("missing '>'")?;
    let close = line.rfind("</paramVector>").ok_or("missing </paramVector>")?;
    if close <= open {
        return Err("empty paramVector".to_string());
    }
    let tokens: Vec<&str> = line[open + 1..close].split_whitespace().collect();
    let all_literal = tokens.iter().all(|tok| tok.parse::<i64>().is_ok());
    let values = tokens
        .iter()
        .map(|tok| tok.parse::<f64>().map_err(|e| format!("bad number {tok:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    let values: [f64; 3] = values
        .try_into()
        .map_err(|v: Vec<f64>| format!("expected 3 values, got {}", v.len()))?;
    Ok((values, all_literal))
}
