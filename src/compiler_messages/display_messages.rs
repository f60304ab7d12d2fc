use crate::compiler_messages::compiler_errors::{
    CompilerError, CompilerMessages, ErrorMetaDataKey, ErrorType,
};
use crate::compiler_messages::compiler_warnings::{CompilerWarning, WarningKind};
use saying::say;
use std::env;
use std::path::Path;

fn relative_display_path(scope: &Path) -> String {
    match env::current_dir() {
        Ok(dir) => scope
            .strip_prefix(&dir)
            .unwrap_or(scope)
            .to_string_lossy()
            .to_string(),
        Err(_) => scope.to_string_lossy().to_string(),
    }
}

pub fn print_compiler_messages(messages: &CompilerMessages) {
    for err in &messages.errors {
        print_formatted_error(err);
    }

    for warning in &messages.warnings {
        print_formatted_warning(warning);
    }
}

pub fn print_formatted_warning(w: &CompilerWarning) {
    let relative_dir = relative_display_path(&w.location.scope);
    let position = w.location.span.to_string();

    say!(Yellow "WARNING ", Dark Yellow w.rule_id);
    say!(Dark Magenta relative_dir, " ", Bright position);

    match &w.warning_kind {
        WarningKind::UndisposedObject { creation, .. } => {
            say!(w.msg);
            say!(Bright Black "  created by: ", creation);
        }
    }
}

pub fn print_formatted_error(e: &CompilerError) {
    let relative_dir = relative_display_path(&e.location.scope);

    match e.error_type {
        ErrorType::DisposeAnalysis => {
            if !relative_dir.is_empty() {
                say!("\n(╯°Д°)╯  🔥🔥 ", Dark Magenta relative_dir, " 🔥🔥  ╰(°□°╰) ");
            }

            say!(Yellow "DISPOSE ANALYSIS BUG - ");
            say!(Dark Yellow "analyzer developer skill issue (not your fault)");
        }

        ErrorType::FlowGraph => {
            if !relative_dir.is_empty() {
                say!("\nヽ༼☉ ‿ ⚆༽ﾉ  🔥🔥🔥 ", Dark Magenta relative_dir, " 🔥🔥🔥  ╰(°□°╰) ");
            }

            say!(Red "Malformed control flow graph");
            say!(Dark Magenta "Line ", Bright {e.location.span.start_line});
        }

        ErrorType::Cancelled => {
            say!(Yellow "Analysis cancelled: ", e.msg);
            return;
        }

        ErrorType::Config => {
            if !relative_dir.is_empty() {
                say!("\n (-_-)  🔥🔥🔥🔥 ", Dark Magenta relative_dir, " 🔥🔥🔥🔥  <(^~^)/ ");
            }
            say!(Yellow "CONFIG FILE ISSUE- ");
            say!(Dark Yellow "Malformed config file, something doesn't make sense inside the analyzer config");
        }

        ErrorType::File => {
            say!(Yellow "🏚 Can't find/read file or directory: ", relative_dir);
            say!(e.msg);
            return;
        }

        ErrorType::Compiler => {
            say!(Yellow "ANALYZER BUG - ");
            say!(Dark Yellow "analyzer developer skill issue (not your fault)");
        }
    }

    say!(Red e.msg);

    if let Some(stage) = e.metadata.get(&ErrorMetaDataKey::CompilationStage) {
        say!(Bright Black "  stage: ", stage);
    }
    if let Some(suggestion) = e.metadata.get(&ErrorMetaDataKey::PrimarySuggestion) {
        say!(Green "  help: ", suggestion);
    }
}
