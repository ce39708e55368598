//! Column role resolution and role-mapped datasets
//!
//! Semantic roles (label, features, group, weight, name, custom) are bound to
//! concrete column names once, against the training schema, and the binding
//! is then reused verbatim for validation, in-training test, and scored data
//! so all phases share identical role semantics.

use crate::data::{is_numeric_dtype, Schema};
use crate::error::{Result, TabTrainError};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Standard column names used when the user declares nothing.
pub mod default_names {
    pub const LABEL: &str = "Label";
    pub const FEATURES: &str = "Features";
    pub const GROUP: &str = "GroupId";
    pub const WEIGHT: &str = "Weight";
    pub const NAME: &str = "Name";
}

/// Outcome of resolving one role against a schema.
///
/// `Declared` means the user named the column, `Defaulted` means the standard
/// name was found, `Unbound` means neither applied. Mandatory-role checks
/// accept either bound variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleResolution {
    Declared(String),
    Defaulted(String),
    Unbound,
}

impl RoleResolution {
    pub fn column(&self) -> Option<&str> {
        match self {
            RoleResolution::Declared(n) | RoleResolution::Defaulted(n) => Some(n),
            RoleResolution::Unbound => None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.column().is_some()
    }
}

/// Feature-role resolution. Features bind to a set of columns: either the
/// user's explicit list, a single default "Features" column when present, or
/// every numeric column not claimed by another role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureResolution {
    Declared(Vec<String>),
    Defaulted(Vec<String>),
    Unbound,
}

impl FeatureResolution {
    pub fn columns(&self) -> &[String] {
        match self {
            FeatureResolution::Declared(c) | FeatureResolution::Defaulted(c) => c,
            FeatureResolution::Unbound => &[],
        }
    }

    pub fn is_bound(&self) -> bool {
        !self.columns().is_empty()
    }
}

/// Resolve a single-column role.
///
/// A declared name must exist in the schema; otherwise the default name is
/// tried, and a missing default leaves the role unbound rather than failing.
pub fn resolve_column(
    schema: &Schema,
    key: &str,
    declared: Option<&str>,
    default: &str,
) -> Result<RoleResolution> {
    match declared {
        Some(name) if !name.trim().is_empty() => {
            if schema.contains(name) {
                Ok(RoleResolution::Declared(name.to_string()))
            } else {
                Err(TabTrainError::MissingColumn {
                    key: key.to_string(),
                    column: name.to_string(),
                })
            }
        }
        _ => {
            if schema.contains(default) {
                Ok(RoleResolution::Defaulted(default.to_string()))
            } else {
                Ok(RoleResolution::Unbound)
            }
        }
    }
}

/// Resolve the feature column set.
pub fn resolve_features(
    schema: &Schema,
    key: &str,
    declared: &[String],
    reserved: &[&str],
) -> Result<FeatureResolution> {
    if !declared.is_empty() {
        for name in declared {
            if !schema.contains(name) {
                return Err(TabTrainError::MissingColumn {
                    key: key.to_string(),
                    column: name.clone(),
                });
            }
        }
        return Ok(FeatureResolution::Declared(declared.to_vec()));
    }

    if schema.contains(default_names::FEATURES) {
        return Ok(FeatureResolution::Defaulted(vec![
            default_names::FEATURES.to_string()
        ]));
    }

    let candidates: Vec<String> = schema
        .numeric_columns()
        .into_iter()
        .filter(|c| !reserved.contains(&c.as_str()))
        .collect();

    if candidates.is_empty() {
        Ok(FeatureResolution::Unbound)
    } else {
        Ok(FeatureResolution::Defaulted(candidates))
    }
}

/// Validate custom (role, column) assignments against a schema.
pub fn check_custom_roles(
    schema: &Schema,
    assignments: &[(String, String)],
) -> Result<Vec<(String, String)>> {
    let mut seen: Vec<&str> = Vec::new();
    for (role, column) in assignments {
        if seen.contains(&role.as_str()) {
            return Err(TabTrainError::DuplicateRole(role.clone()));
        }
        seen.push(role);
        if !schema.contains(column) {
            return Err(TabTrainError::MissingColumn {
                key: format!("col[{}]", role),
                column: column.clone(),
            });
        }
    }
    Ok(assignments.to_vec())
}

/// Declared column names as supplied by the user; `None` falls back to the
/// standard defaults during resolution.
#[derive(Debug, Clone, Default)]
pub struct DeclaredColumns {
    pub label: Option<String>,
    pub features: Vec<String>,
    pub group: Option<String>,
    pub weight: Option<String>,
    pub name: Option<String>,
    pub custom: Vec<(String, String)>,
}

/// The full binding of roles to column names in one dataset's schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleBinding {
    pub label: RoleResolution,
    pub features: FeatureResolution,
    pub group: RoleResolution,
    pub weight: RoleResolution,
    pub row_name: RoleResolution,
    pub custom: Vec<(String, String)>,
}

impl RoleBinding {
    /// Resolve every role against a schema. Pure: no side effects.
    pub fn resolve(schema: &Schema, declared: &DeclaredColumns) -> Result<Self> {
        let label = resolve_column(
            schema,
            "labelColumn",
            declared.label.as_deref(),
            default_names::LABEL,
        )?;
        let group = resolve_column(
            schema,
            "groupColumn",
            declared.group.as_deref(),
            default_names::GROUP,
        )?;
        let weight = resolve_column(
            schema,
            "weightColumn",
            declared.weight.as_deref(),
            default_names::WEIGHT,
        )?;
        let row_name = resolve_column(
            schema,
            "nameColumn",
            declared.name.as_deref(),
            default_names::NAME,
        )?;
        let custom = check_custom_roles(schema, &declared.custom)?;

        let mut reserved: Vec<&str> = Vec::new();
        for res in [&label, &group, &weight, &row_name] {
            if let Some(c) = res.column() {
                reserved.push(c);
            }
        }
        for (_, c) in &custom {
            reserved.push(c);
        }
        let features = resolve_features(schema, "featureColumn", &declared.features, &reserved)?;

        Ok(Self {
            label,
            features,
            group,
            weight,
            row_name,
            custom,
        })
    }

    /// Check the roles that training cannot proceed without.
    pub fn require_training_roles(&self) -> Result<()> {
        if !self.label.is_bound() {
            return Err(TabTrainError::MissingColumn {
                key: "labelColumn".to_string(),
                column: default_names::LABEL.to_string(),
            });
        }
        if !self.features.is_bound() {
            return Err(TabTrainError::MissingColumn {
                key: "featureColumn".to_string(),
                column: default_names::FEATURES.to_string(),
            });
        }
        Ok(())
    }

    /// Rebind against a new schema, degrading roles whose columns are absent
    /// to `Unbound` instead of failing. Used for the scored dataset, whose
    /// schema extends the test schema.
    pub fn rebind_permissive(&self, schema: &Schema) -> Self {
        let keep = |res: &RoleResolution| match res.column() {
            Some(c) if schema.contains(c) => res.clone(),
            _ => RoleResolution::Unbound,
        };
        let features = {
            let kept: Vec<String> = self
                .features
                .columns()
                .iter()
                .filter(|c| schema.contains(c))
                .cloned()
                .collect();
            if kept.is_empty() {
                FeatureResolution::Unbound
            } else {
                match self.features {
                    FeatureResolution::Declared(_) => FeatureResolution::Declared(kept),
                    _ => FeatureResolution::Defaulted(kept),
                }
            }
        };
        Self {
            label: keep(&self.label),
            features,
            group: keep(&self.group),
            weight: keep(&self.weight),
            row_name: keep(&self.row_name),
            custom: self
                .custom
                .iter()
                .filter(|(_, c)| schema.contains(c))
                .cloned()
                .collect(),
        }
    }

    /// Same binding with the feature role removed. Used for the per-instance
    /// output, which must not carry feature columns.
    pub fn without_features(&self) -> Self {
        let mut binding = self.clone();
        binding.features = FeatureResolution::Unbound;
        binding
    }
}

/// A dataset paired with its role binding; immutable once constructed.
#[derive(Debug, Clone)]
pub struct RoleMappedData {
    data: DataFrame,
    binding: RoleBinding,
}

impl RoleMappedData {
    pub fn new(data: DataFrame, binding: RoleBinding) -> Self {
        Self { data, binding }
    }

    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn binding(&self) -> &RoleBinding {
        &self.binding
    }

    pub fn height(&self) -> usize {
        self.data.height()
    }

    /// Extract a named column as f64 values.
    pub fn column_values(&self, name: &str) -> Result<Array1<f64>> {
        column_to_f64(&self.data, name)
    }

    /// Label column values. Errors if the label role is unbound.
    pub fn label_values(&self) -> Result<Array1<f64>> {
        let col = self.binding.label.column().ok_or_else(|| {
            TabTrainError::DataError("label role is not bound".to_string())
        })?;
        self.column_values(col)
    }

    /// Weight column values, when the weight role is bound.
    pub fn weight_values(&self) -> Result<Option<Array1<f64>>> {
        match self.binding.weight.column() {
            Some(col) => Ok(Some(self.column_values(col)?)),
            None => Ok(None),
        }
    }

    /// Feature columns as a row-major matrix.
    pub fn feature_matrix(&self) -> Result<Array2<f64>> {
        columns_to_array2(&self.data, self.binding.features.columns())
    }
}

/// Extract one column as f64, casting if needed. Nulls become 0.0.
pub fn column_to_f64(df: &DataFrame, name: &str) -> Result<Array1<f64>> {
    let series = df
        .column(name)
        .map_err(|_| TabTrainError::DataError(format!("column '{}' not found", name)))?
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| TabTrainError::DataError(e.to_string()))?;
    let values: Vec<f64> = series
        .f64()
        .map_err(|e| TabTrainError::DataError(e.to_string()))?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect();
    Ok(Array1::from_vec(values))
}

/// Extract named columns into a row-major Array2<f64>.
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    if col_names.is_empty() {
        return Err(TabTrainError::DataError(
            "no feature columns bound".to_string(),
        ));
    }
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Array1<f64>> = col_names
        .iter()
        .map(|name| column_to_f64(df, name))
        .collect::<Result<Vec<_>>>()?;

    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        col_data[c][r]
    }))
}

/// Verify a column holds numeric data before binding it to a numeric role.
pub fn check_numeric_role(schema: &Schema, res: &RoleResolution, key: &str) -> Result<()> {
    if let Some(col) = res.column() {
        if let Some(dtype) = schema.dtype(col) {
            if !is_numeric_dtype(dtype) {
                return Err(TabTrainError::DataError(format!(
                    "column '{}' bound by '{}' is not numeric",
                    col, key
                )));
            }
        }
    }
    Ok(())
}
