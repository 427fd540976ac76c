//! Style functions which resolve a property for a zoom level and optionally a feature.

use std::{fmt, sync::Arc};

use csscolorparser::Color;
use serde_json::Value;

use crate::{
    error::Error,
    geometry::Feature,
    style::property::{Property, ValueKind},
};

/// A resolved style value.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    Number(f32),
    /// Straight (not premultiplied) RGBA in `0.0..=1.0`.
    Color([f32; 4]),
    Array(Vec<f32>),
}

impl StyleValue {
    /// Flattens the value into exactly `n` floats, padding with zeros or truncating.
    pub fn to_components(&self, n: usize) -> Vec<f32> {
        let mut components = match self {
            StyleValue::Number(value) => vec![*value],
            StyleValue::Color(rgba) => rgba.to_vec(),
            StyleValue::Array(values) => values.clone(),
        };
        components.resize(n, 0.0);
        components
    }

    fn parse(kind: ValueKind, value: &Value) -> Result<StyleValue, Error> {
        match kind {
            ValueKind::Number => value
                .as_f64()
                .map(|number| StyleValue::Number(number as f32))
                .ok_or_else(|| Error::Style(format!("expected a number, got {value}"))),
            ValueKind::Color => {
                let color: Color = value
                    .as_str()
                    .ok_or_else(|| Error::Style(format!("expected a color, got {value}")))?
                    .parse()
                    .map_err(|e| Error::Style(format!("invalid color {value}: {e}")))?;
                Ok(StyleValue::Color([
                    color.r as f32,
                    color.g as f32,
                    color.b as f32,
                    color.a as f32,
                ]))
            }
            ValueKind::Array => value
                .as_array()
                .and_then(|values| {
                    values
                        .iter()
                        .map(|value| value.as_f64().map(|number| number as f32))
                        .collect::<Option<Vec<_>>>()
                })
                .map(StyleValue::Array)
                .ok_or_else(|| Error::Style(format!("expected an array of numbers, got {value}"))),
        }
    }

    fn interpolate(&self, other: &StyleValue, t: f32) -> StyleValue {
        let lerp = |a: f32, b: f32| a + (b - a) * t;
        match (self, other) {
            (StyleValue::Number(a), StyleValue::Number(b)) => StyleValue::Number(lerp(*a, *b)),
            (StyleValue::Color(a), StyleValue::Color(b)) => StyleValue::Color([
                lerp(a[0], b[0]),
                lerp(a[1], b[1]),
                lerp(a[2], b[2]),
                lerp(a[3], b[3]),
            ]),
            (StyleValue::Array(a), StyleValue::Array(b)) if a.len() == b.len() => {
                StyleValue::Array(a.iter().zip(b).map(|(a, b)| lerp(*a, *b)).collect())
            }
            _ => self.clone(),
        }
    }
}

pub type ZoomFn = Arc<dyn Fn(f64) -> StyleValue + Send + Sync>;
pub type FeatureFn = Arc<dyn Fn(f64, &Feature) -> StyleValue + Send + Sync>;

/// A property value which is either constant, depends only on the zoom or depends on the
/// attributes of each feature.
///
/// Feature dependent values are baked into per-vertex buffers when a tile is loaded. All
/// others are uploaded as uniforms once per draw.
#[derive(Clone)]
pub enum StyleFunction {
    Constant(StyleValue),
    ZoomDependent(ZoomFn),
    FeatureDependent(FeatureFn),
}

impl fmt::Debug for StyleFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleFunction::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            StyleFunction::ZoomDependent(_) => f.write_str("ZoomDependent(..)"),
            StyleFunction::FeatureDependent(_) => f.write_str("FeatureDependent(..)"),
        }
    }
}

impl StyleFunction {
    pub fn zoom<F>(f: F) -> Self
    where
        F: Fn(f64) -> StyleValue + Send + Sync + 'static,
    {
        StyleFunction::ZoomDependent(Arc::new(f))
    }

    pub fn feature<F>(f: F) -> Self
    where
        F: Fn(f64, &Feature) -> StyleValue + Send + Sync + 'static,
    {
        StyleFunction::FeatureDependent(Arc::new(f))
    }

    pub fn is_feature_dependent(&self) -> bool {
        matches!(self, StyleFunction::FeatureDependent(_))
    }

    /// Evaluates the function. Returns `None` for feature dependent functions if no feature is
    /// given.
    pub fn evaluate(&self, zoom: f64, feature: Option<&Feature>) -> Option<StyleValue> {
        match self {
            StyleFunction::Constant(value) => Some(value.clone()),
            StyleFunction::ZoomDependent(f) => Some(f(zoom)),
            StyleFunction::FeatureDependent(f) => feature.map(|feature| f(zoom, feature)),
        }
    }

    /// Builds a function from a style declaration.
    ///
    /// Supported are plain constants, zoom functions (`{"stops": [[z, v], ...], "base": b}`)
    /// and property functions (`{"property": p, "stops": [...], "type": t, "default": v}`).
    pub fn from_json(property: Property, declaration: &Value) -> Result<Self, Error> {
        let kind = property.value_kind();
        let Some(object) = declaration.as_object() else {
            return StyleValue::parse(kind, declaration).map(StyleFunction::Constant);
        };

        let function_type = object.get("type").and_then(Value::as_str);
        let base = object.get("base").and_then(Value::as_f64).unwrap_or(1.0);

        match object.get("property").and_then(Value::as_str) {
            None => {
                let stops = parse_zoom_stops(kind, object.get("stops"))?;
                let interpolate = match function_type {
                    None | Some("exponential") => kind != ValueKind::Array,
                    Some("interval") => false,
                    Some(other) => {
                        return Err(Error::Style(format!(
                            "unsupported zoom function type {other} for {}",
                            property.key()
                        )))
                    }
                };
                Ok(StyleFunction::zoom(move |zoom| {
                    evaluate_stops(&stops, zoom, base, interpolate)
                }))
            }
            Some(name) => {
                let name = name.to_string();
                let fallback = match object.get("default") {
                    Some(value) => StyleValue::parse(kind, value)?,
                    None => property.default_value(),
                };

                if function_type == Some("identity") {
                    return Ok(StyleFunction::feature(move |_, feature| {
                        feature
                            .properties
                            .get(&name)
                            .and_then(|value| StyleValue::parse(kind, value).ok())
                            .unwrap_or_else(|| fallback.clone())
                    }));
                }

                let raw_stops = object
                    .get("stops")
                    .and_then(Value::as_array)
                    .ok_or_else(|| Error::Style(format!("{} has no stops", property.key())))?;
                let categorical = match function_type {
                    Some("categorical") => true,
                    Some("exponential") | Some("interval") => false,
                    None => raw_stops
                        .first()
                        .and_then(|stop| stop.get(0))
                        .map_or(false, |input| !input.is_number()),
                    Some(other) => {
                        return Err(Error::Style(format!(
                            "unsupported property function type {other} for {}",
                            property.key()
                        )))
                    }
                };

                if categorical {
                    let stops = raw_stops
                        .iter()
                        .map(|stop| {
                            let (input, output) = split_stop(stop)?;
                            Ok((input.clone(), StyleValue::parse(kind, output)?))
                        })
                        .collect::<Result<Vec<_>, Error>>()?;
                    Ok(StyleFunction::feature(move |_, feature| {
                        feature
                            .properties
                            .get(&name)
                            .and_then(|value| {
                                stops
                                    .iter()
                                    .find(|(input, _)| input == value)
                                    .map(|(_, output)| output.clone())
                            })
                            .unwrap_or_else(|| fallback.clone())
                    }))
                } else {
                    let stops = parse_zoom_stops(kind, object.get("stops"))?;
                    let interpolate =
                        function_type != Some("interval") && kind != ValueKind::Array;
                    Ok(StyleFunction::feature(move |_, feature| {
                        feature
                            .properties
                            .get(&name)
                            .and_then(Value::as_f64)
                            .map(|input| evaluate_stops(&stops, input, base, interpolate))
                            .unwrap_or_else(|| fallback.clone())
                    }))
                }
            }
        }
    }
}

fn split_stop(stop: &Value) -> Result<(&Value, &Value), Error> {
    match stop.as_array().map(Vec::as_slice) {
        Some([input, output]) => Ok((input, output)),
        _ => Err(Error::Style(format!("malformed stop {stop}"))),
    }
}

fn parse_zoom_stops(kind: ValueKind, stops: Option<&Value>) -> Result<Vec<(f64, StyleValue)>, Error> {
    let stops = stops
        .and_then(Value::as_array)
        .filter(|stops| !stops.is_empty())
        .ok_or_else(|| Error::Style("function without stops".to_string()))?;

    stops
        .iter()
        .map(|stop| {
            let (input, output) = split_stop(stop)?;
            let input = input
                .as_f64()
                .ok_or_else(|| Error::Style(format!("stop input must be a number: {stop}")))?;
            Ok((input, StyleValue::parse(kind, output)?))
        })
        .collect()
}

/// Evaluates piecewise stops. Inputs outside the stop range clamp to the first or last output.
fn evaluate_stops(stops: &[(f64, StyleValue)], input: f64, base: f64, interpolate: bool) -> StyleValue {
    let upper = stops.iter().position(|(stop, _)| *stop > input);
    match upper {
        Some(0) => stops[0].1.clone(),
        None => stops[stops.len() - 1].1.clone(),
        Some(i) => {
            let (x0, lower_value) = &stops[i - 1];
            let (x1, upper_value) = &stops[i];
            if !interpolate {
                return lower_value.clone();
            }
            let t = interpolation_factor(input, base, *x0, *x1);
            lower_value.interpolate(upper_value, t as f32)
        }
    }
}

fn interpolation_factor(input: f64, base: f64, lower: f64, upper: f64) -> f64 {
    let difference = upper - lower;
    let progress = input - lower;
    if difference == 0.0 {
        0.0
    } else if base == 1.0 {
        progress / difference
    } else {
        (base.powf(progress) - 1.0) / (base.powf(difference) - 1.0)
    }
}
