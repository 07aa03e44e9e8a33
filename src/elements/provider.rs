use serde::Deserialize;

use crate::elements::{ElementsOrigin, OrbitalElements, SatelliteTarget, SourceError};

/// How a provider's response body is turned into elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// JSON object with `line1`/`line2`, or a combined `tle` blob.
    Json,
    /// Plain-text multi-satellite catalog of 3-line blocks.
    Catalog,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Provider {
    pub name: String,
    pub url: String,
    pub format: ResponseFormat,
}

impl Provider {
    pub fn new(name: &str, url: &str, format: ResponseFormat) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            format,
        }
    }

    /// Parses and validates a response body from this provider.
    pub fn parse(
        &self,
        body: &str,
        target: &SatelliteTarget,
    ) -> Result<OrbitalElements, SourceError> {
        let (name, line1, line2) = match self.format {
            ResponseFormat::Json => parse_json(body)?,
            ResponseFormat::Catalog => parse_catalog(body, target)?,
        };

        let elements = OrbitalElements {
            name: name.unwrap_or_else(|| format!("NORAD {}", target.norad_id)),
            line1,
            line2,
            origin: ElementsOrigin::Live {
                provider: self.name.clone(),
            },
        };
        elements.validate().map_err(SourceError::Invalid)?;

        if !target.matches_line1(&elements.line1) {
            return Err(SourceError::Invalid(format!(
                "expected catalog number {}",
                target.norad_id
            )));
        }

        Ok(elements)
    }
}

pub fn default_providers() -> Vec<Provider> {
    vec![
        Provider::new(
            "ivanstanojevic",
            "https://tle.ivanstanojevic.me/api/tle/25544",
            ResponseFormat::Json,
        ),
        Provider::new(
            "wheretheiss",
            "https://api.wheretheiss.at/v1/satellites/25544/tles",
            ResponseFormat::Json,
        ),
        Provider::new(
            "celestrak-gp",
            "https://celestrak.org/NORAD/elements/gp.php?GROUP=stations&FORMAT=3le",
            ResponseFormat::Catalog,
        ),
        Provider::new(
            "celestrak-com",
            "https://celestrak.com/NORAD/elements/stations.txt",
            ResponseFormat::Catalog,
        ),
        Provider::new(
            "celestrak-org",
            "https://celestrak.org/NORAD/elements/stations.txt",
            ResponseFormat::Catalog,
        ),
    ]
}

#[derive(Deserialize)]
struct JsonTle {
    name: Option<String>,
    header: Option<String>,
    line1: Option<String>,
    line2: Option<String>,
    tle: Option<String>,
}

type RawTle = (Option<String>, String, String);

fn parse_json(body: &str) -> Result<RawTle, SourceError> {
    let json: JsonTle = serde_json::from_str(body)?;
    let name = json
        .header
        .or(json.name)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    if let (Some(line1), Some(line2)) = (json.line1, json.line2) {
        return Ok((name, line1.trim().to_string(), line2.trim().to_string()));
    }

    let blob = json
        .tle
        .ok_or_else(|| SourceError::Invalid("JSON has neither line1/line2 nor tle".into()))?;
    let lines: Vec<&str> = blob
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    match lines.as_slice() {
        [line1, line2] => Ok((name, line1.to_string(), line2.to_string())),
        [title, line1, line2] => Ok((
            name.or_else(|| Some(title.to_string())),
            line1.to_string(),
            line2.to_string(),
        )),
        _ => Err(SourceError::Invalid(format!(
            "tle blob has {} lines",
            lines.len()
        ))),
    }
}

fn parse_catalog(body: &str, target: &SatelliteTarget) -> Result<RawTle, SourceError> {
    let blocks = parse_multi_tle(body);
    let hint = target.name_hint.to_uppercase();

    let by_number = blocks
        .iter()
        .position(|(_, line1, _)| target.matches_line1(line1));
    let by_name = || {
        blocks.iter().position(|(name, _, _)| {
            name.as_deref()
                .is_some_and(|n| n.to_uppercase().contains(&hint))
        })
    };

    by_number
        .or_else(by_name)
        .map(|i| blocks[i].clone())
        .ok_or_else(|| SourceError::NotInCatalog(target.name_hint.clone()))
}

/// Splits catalog text into `(name, line1, line2)` blocks. Names are optional.
fn parse_multi_tle(content: &str) -> Vec<RawTle> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            result.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            // 3LE title lines may carry a leading "0 "
            let name = lines[i].strip_prefix("0 ").unwrap_or(lines[i]);
            result.push((
                Some(name.to_string()),
                lines[i + 1].to_string(),
                lines[i + 2].to_string(),
            ));
            i += 3;
        } else {
            i += 1;
        }
    }

    result
}
