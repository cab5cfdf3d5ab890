//! Enum registry command handlers.

use serde::Serialize;
use tabled::Tabled;

use satnms_core::enums::FamilyEntry;
use satnms_core::{Direction, EnumRegistry, EnumValue};

use crate::cli::{EnumsArgs, EnumsCommand, GlobalOpts, TranslateTo};
use crate::error::CliError;
use crate::output;

#[derive(Clone, Copy, Serialize, Tabled)]
struct FamilyRow {
    #[tabled(rename = "Family")]
    name: &'static str,
    #[tabled(rename = "Members")]
    members: usize,
}

#[derive(Clone, Copy, Serialize, Tabled)]
struct MemberRow {
    #[tabled(rename = "Code")]
    code: i64,
    #[tabled(rename = "Label")]
    label: &'static str,
    #[tabled(rename = "Deprecated")]
    deprecated: bool,
}

pub fn handle(args: EnumsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let registry = EnumRegistry::global();

    let out = match args.command {
        EnumsCommand::List { family: None, .. } => {
            let families: Vec<FamilyRow> = registry
                .families()
                .iter()
                .map(|f| FamilyRow {
                    name: f.name(),
                    members: f.len(),
                })
                .collect();
            output::render_list(
                &global.output,
                &families,
                |f| *f,
                |f| f.name.to_owned(),
            )?
        }

        EnumsCommand::List {
            family: Some(name),
            all,
        } => {
            let table = registry.family(&name).ok_or_else(|| CliError::NotFound {
                what: "enum family".into(),
                identifier: name.clone(),
            })?;
            let members: Vec<MemberRow> = if all {
                table.entries().map(MemberRow::from_entry).collect()
            } else {
                table.active_entries().map(MemberRow::from_entry).collect()
            };
            output::render_list(
                &global.output,
                &members,
                |m| *m,
                |m| format!("{}\t{}", m.code, m.label),
            )?
        }

        EnumsCommand::Translate { family, value, to } => {
            let direction = match to {
                TranslateTo::Label => Direction::ToLabel,
                TranslateTo::Code => Direction::ToCode,
            };
            let translated =
                registry.translate(&family, &EnumValue::parse_lenient(&value), direction)?;
            output::render_single(
                &global.output,
                &translated,
                ToString::to_string,
                ToString::to_string,
            )?
        }
    };

    output::print_output(&out, global.quiet);
    Ok(())
}

impl MemberRow {
    fn from_entry(entry: FamilyEntry) -> Self {
        Self {
            code: entry.code,
            label: entry.label,
            deprecated: entry.deprecated,
        }
    }
}
