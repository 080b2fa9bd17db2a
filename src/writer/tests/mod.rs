mod driver;
mod rewrite;

use super::WriteFormattingOptions;

/// 测试用的"素"配置：控制字符直接给真实值，免去文本替换步骤
pub(super) fn plain_options() -> WriteFormattingOptions {
    WriteFormattingOptions {
        is_category_label: false,
        label_mapping_file: None,
        transpose: true,
        prologue: String::new(),
        epilogue: String::new(),
        sequence_separator: String::new(),
        sequence_prologue: String::new(),
        sequence_epilogue: String::new(),
        element_separator: " ".to_string(),
        sample_separator: "\n".to_string(),
        precision_format: String::new(),
    }
}
