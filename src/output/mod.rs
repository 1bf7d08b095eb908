pub mod formatter;

pub use formatter::{
    format_answer_key, format_appeal_line, format_ranking_table, format_result_detail,
    should_use_colors,
};
