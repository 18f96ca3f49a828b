//! Printable model summary.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct LayerSummary {
    pub name: String,
    pub kind: String,
    pub output_shape: String,
    pub params: usize,
}

impl LayerSummary {
    pub fn new(name: &str, kind: &str, output_shape: String, params: usize) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            output_shape,
            params,
        }
    }
}

/// Layer table in the style of a Keras `model.summary()`.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub layers: Vec<LayerSummary>,
}

impl ModelSummary {
    pub fn new(layers: Vec<LayerSummary>) -> Self {
        Self { layers }
    }

    pub fn total_params(&self) -> usize {
        self.layers.iter().map(|l| l.params).sum()
    }
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(64);
        writeln!(f, "{:<32}{:<20}{:>12}", "Layer (type)", "Output Shape", "Param #")?;
        writeln!(f, "{}", rule)?;
        for layer in &self.layers {
            let label = format!("{} ({})", layer.name, layer.kind);
            writeln!(f, "{:<32}{:<20}{:>12}", label, layer.output_shape, layer.params)?;
        }
        writeln!(f, "{}", rule)?;
        write!(f, "Total params: {}", self.total_params())
    }
}
