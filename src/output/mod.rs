pub mod formatter;

pub use formatter::{
    format_age, format_catalog, format_control_list, format_control_score, format_control_tsv,
    format_family_scores, format_family_tsv, format_overall, format_record, format_score, should_use_colors,
};
