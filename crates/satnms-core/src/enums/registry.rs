// ── Runtime enum registry ──
//
// Name-addressed view over the built-in families. Tables are copied out of
// the generated enums once, so lookups never need the concrete type.

use std::sync::LazyLock;

use serde::Serialize;

use super::{
    AccessLevel, ControllerMode, DeviceModel, DeviceState, EnumFamily, EnumValue, Modulation,
    ObjectState, RollOff, RouteType, ShaperMode, StationMode,
};
use crate::error::CoreError;

static BUILTIN: LazyLock<EnumRegistry> = LazyLock::new(EnumRegistry::builtin);

/// Translation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Numeric code to label.
    ToLabel,
    /// Label to numeric code.
    ToCode,
}

/// One member of a family table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FamilyEntry {
    pub code: i64,
    pub label: &'static str,
    pub deprecated: bool,
}

/// A family's parallel views.
#[derive(Debug, Clone)]
pub struct FamilyTable {
    name: &'static str,
    codes: &'static [i64],
    labels: &'static [&'static str],
    deprecated: Vec<bool>,
}

impl FamilyTable {
    pub fn of<T: EnumFamily>() -> Self {
        Self {
            name: T::FAMILY,
            codes: T::CODES,
            labels: T::LABELS,
            deprecated: T::ALL.iter().map(|v| v.is_deprecated()).collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn codes(&self) -> &'static [i64] {
        self.codes
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// All members in declaration order, deprecated ones included.
    pub fn entries(&self) -> impl Iterator<Item = FamilyEntry> + '_ {
        self.codes
            .iter()
            .zip(self.labels)
            .zip(&self.deprecated)
            .map(|((&code, &label), &deprecated)| FamilyEntry {
                code,
                label,
                deprecated,
            })
    }

    pub fn active_entries(&self) -> impl Iterator<Item = FamilyEntry> + '_ {
        self.entries().filter(|e| !e.deprecated)
    }

    fn position(&self, value: &EnumValue) -> Option<usize> {
        match value {
            EnumValue::Code(code) => self.codes.iter().position(|c| c == code),
            EnumValue::Label(label) => {
                let label = label.trim();
                self.labels
                    .iter()
                    .position(|l| *l == label)
                    .or_else(|| self.labels.iter().position(|l| l.eq_ignore_ascii_case(label)))
                    .or_else(|| {
                        let code = label.parse::<i64>().ok()?;
                        self.codes.iter().position(|c| *c == code)
                    })
            }
        }
    }

    /// Convert `value` into the encoding named by `direction`.
    ///
    /// Either encoding is accepted as input; the output is canonical
    /// (exact label spelling).
    pub fn translate(&self, value: &EnumValue, direction: Direction) -> Result<EnumValue, CoreError> {
        let pos = self
            .position(value)
            .ok_or_else(|| CoreError::UnknownEnumValue {
                family: self.name.to_owned(),
                value: value.to_string(),
            })?;

        let translated = match direction {
            Direction::ToLabel => self.labels.get(pos).map(|l| EnumValue::Label((*l).to_owned())),
            Direction::ToCode => self.codes.get(pos).map(|c| EnumValue::Code(*c)),
        };
        translated.ok_or_else(|| CoreError::Internal(format!("{} table out of step", self.name)))
    }
}

/// Registry of every built-in family, addressable by name.
#[derive(Debug, Clone)]
pub struct EnumRegistry {
    families: Vec<FamilyTable>,
}

impl EnumRegistry {
    pub fn builtin() -> Self {
        Self {
            families: vec![
                FamilyTable::of::<ObjectState>(),
                FamilyTable::of::<DeviceState>(),
                FamilyTable::of::<ControllerMode>(),
                FamilyTable::of::<StationMode>(),
                FamilyTable::of::<DeviceModel>(),
                FamilyTable::of::<Modulation>(),
                FamilyTable::of::<RollOff>(),
                FamilyTable::of::<ShaperMode>(),
                FamilyTable::of::<RouteType>(),
                FamilyTable::of::<AccessLevel>(),
            ],
        }
    }

    /// Process-wide instance of [`builtin()`](Self::builtin).
    pub fn global() -> &'static Self {
        &BUILTIN
    }

    pub fn families(&self) -> &[FamilyTable] {
        &self.families
    }

    /// Look up a family by name; `-` and `_` are interchangeable.
    pub fn family(&self, name: &str) -> Option<&FamilyTable> {
        let wanted = name.trim().replace('-', "_");
        self.families
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(&wanted))
    }

    pub fn translate(
        &self,
        family: &str,
        value: &EnumValue,
        direction: Direction,
    ) -> Result<EnumValue, CoreError> {
        let table = self.family(family).ok_or_else(|| CoreError::InvalidUsage {
            message: format!("unknown enum family `{family}`"),
        })?;
        table.translate(value, direction)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn registry_tables_are_aligned() {
        for table in EnumRegistry::global().families() {
            assert_eq!(table.codes().len(), table.labels().len(), "{}", table.name());
            assert_eq!(table.entries().count(), table.len());
        }
    }

    #[test]
    fn label_code_label_is_identity_for_every_member() {
        let registry = EnumRegistry::builtin();
        for table in registry.families() {
            for entry in table.entries() {
                let code = table
                    .translate(&EnumValue::Label(entry.label.into()), Direction::ToCode)
                    .unwrap();
                let label = table.translate(&code, Direction::ToLabel).unwrap();
                assert_eq!(label, EnumValue::Label(entry.label.into()));
            }
        }
    }

    #[test]
    fn translate_by_family_name() {
        let registry = EnumRegistry::builtin();
        let v = registry
            .translate("controller-mode", &EnumValue::Code(1), Direction::ToLabel)
            .unwrap();
        assert_eq!(v, EnumValue::Label("MF_hub".into()));

        let v = registry
            .translate("station_mode", &EnumValue::Label("STAR".into()), Direction::ToCode)
            .unwrap();
        assert_eq!(v, EnumValue::Code(1));
    }

    #[test]
    fn unknown_family_and_value() {
        let registry = EnumRegistry::builtin();
        assert!(matches!(
            registry.translate("nope", &EnumValue::Code(0), Direction::ToLabel),
            Err(CoreError::InvalidUsage { .. })
        ));
        assert!(matches!(
            registry.translate("roll_off", &EnumValue::Code(99), Direction::ToLabel),
            Err(CoreError::UnknownEnumValue { .. })
        ));
    }

    #[test]
    fn active_entries_skip_deprecated() {
        let table = EnumRegistry::global().family("controller_mode").unwrap();
        assert_eq!(table.active_entries().count(), table.len() - 1);
        assert!(table.active_entries().all(|e| e.label != "hub"));
    }
}
