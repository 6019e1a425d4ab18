mod apply;
mod collision;
mod config;
mod date;
mod export;
mod pattern;
mod planner;
mod presets;
mod record;
mod rules;
mod scan;
mod session;
mod template;
mod tokenizer;

pub use apply::{
    apply_plan, default_copy_folder, ApplyMode, ApplyReport, FileOps, ItemReport, OpOutcome,
    StdFileOps,
};
pub use collision::{resolve_collisions, resolve_collisions_with_report, CollisionReport};
pub use config::{
    app_paths, load_config, load_config_from, save_config, save_config_to, AppConfig,
    ApplyModeSetting, AppPaths,
};
pub use date::{classify_date, classify_date_in, is_date, DateFormat, DateParts, MIN_YEAR};
pub use export::{default_export_file_name, export_csv, export_csv_file, export_json};
pub use pattern::{detect_pattern, PatternDescriptor, MAJORITY_THRESHOLD};
pub use planner::{
    expand_name, generate_plan, generate_plan_with_pattern, render_preview_sample, PlanError, PlanOptions, RenameCandidate,
    RenamePlan, RenameStats, DEFAULT_TEMPLATE,
};
pub use presets::{load_preset, save_preset, JsonPresetStore, Preset, PresetStore};
pub use record::{FileRecord, RenameResult};
pub use rules::{apply_rules, RenameRule, RuleSet};
pub use scan::{list_files, records_from_paths, ScanOptions, ScanResult, ScanStats};
pub use session::RenameSession;
pub use template::{
    format_counter, parse_template, render_template, validate_template, FileTokens, Placeholder,
    TemplateError, TemplatePart,
};
pub use tokenizer::{
    detect_delimiter, split_extension, tokenize, tokenize_with, DEFAULT_DELIMITERS,
    LEGACY_DELIMITERS,
};
