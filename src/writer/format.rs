/*
 * @Author       : 老董
 * @Date         : 2026-08-13
 * @Description  : 序列感知格式化：打包缓冲 + 小批量布局 + 格式化配置 → 文本
 */

use super::options::format_float;
use super::{LabelMapping, ValueFormat, WriteError, WriteFormattingOptions};
use crate::data::MbLayout;
use crate::tensor::Tensor;
use std::io::Write;

/// 把一个节点的打包缓冲按布局逐序列渲染成文本写入`writer`。
///
/// 缓冲约定为`[行维, 槽位数 × 宽度]`，时间步`t`、槽位`s`的列号是
/// `s + t × 槽位数`。`layout`缺省时当作一条长度为1的序列处理。
///
/// `num_mbs_run`是整个运行已写出的小批量数：序列分隔符在"整个运行
/// 写出的第一条序列"之前不发出，于是连续小批量在目的流里读起来是
/// 一条不断续写的序列流。
///
/// 传入的`options`应已对该节点做过文本替换（见
/// [`WriteFormattingOptions::processed`]）。
pub fn write_node_buffer(
    writer: &mut dyn Write,
    node_name: &str,
    value: &Tensor,
    layout: Option<&MbLayout>,
    options: &WriteFormattingOptions,
    mapping: Option<&LabelMapping>,
    num_mbs_run: usize,
) -> Result<(), WriteError> {
    let shape = value.shape();
    let dim = shape[0];

    let default_layout;
    let layout = match layout {
        Some(layout) => layout,
        None => {
            default_layout = MbLayout::frame_mode(1);
            &default_layout
        }
    };
    let slots = layout.num_parallel_sequences();
    let width = layout.num_time_steps();

    let format = options.value_format(mapping.is_some());
    if format == ValueFormat::CategoryLabel {
        let mapping_len = mapping.map_or(0, LabelMapping::len);
        if mapping_len != dim {
            return Err(WriteError::LabelMappingSizeMismatch {
                node_name: node_name.to_string(),
                mapping_len,
                row_dim: dim,
            });
        }
    }

    // 提取到短命临时缓冲（列主序：idx = 行 + 列×行维），
    // 类别归约在它上面就地改写，任何出口路径都随 Vec 一并释放
    let mut temp: Vec<f32> = Vec::with_capacity(dim * slots * width);
    for col in 0..slots * width {
        for row in 0..dim {
            temp.push(value[[row, col]]);
        }
    }

    // 类别标签模式：每列归约为最大值下标，写回该列首槽，
    // 此后特征维视为1。比较以"未设置"哨兵起步：首个下标无条件
    // 命中，其后仅当值 >= 当前最大值才取代（内部平局取靠后下标）
    let effective_dim = if options.is_category_label {
        for seq in layout.sequences() {
            let (t0, t1) = clip_range(seq.t_begin, seq.t_end, width);
            for t in t0..t1 {
                let col = seq.slot + t * slots;
                let mut max_pos: isize = -1;
                let mut max_val = 0.0f32;
                for i in 0..dim {
                    let v = temp[i + col * dim];
                    if max_pos < 0 || v >= max_val {
                        max_pos = i as isize;
                        max_val = v;
                    }
                }
                temp[col * dim] = max_pos as f32;
            }
        }
        1
    } else {
        dim
    };

    let mut out = String::new();
    for (s, seq) in layout.sequences().iter().enumerate() {
        let (t0, t1) = clip_range(seq.t_begin, seq.t_end, width);

        // 连续性规则：整个运行最初的那条序列前不放分隔符
        if num_mbs_run > 0 || s > 0 {
            out.push_str(&options.sequence_separator);
        }
        out.push_str(&options.sequence_prologue);

        // transpose=true：外层时间步（一行一个样本），内层特征维；
        // false 则反过来。行间用 sample_separator，行内用 element_separator
        let (outer_len, inner_len) = if options.transpose {
            (t1 - t0, effective_dim)
        } else {
            (effective_dim, t1 - t0)
        };
        for outer in 0..outer_len {
            if outer > 0 {
                out.push_str(&options.sample_separator);
            }
            for inner in 0..inner_len {
                if inner > 0 {
                    out.push_str(&options.element_separator);
                }
                let (i, t) = if options.transpose {
                    (inner, t0 + outer)
                } else {
                    (outer, t0 + inner)
                };
                let col = seq.slot + t * slots;
                let v = temp[i + col * dim];
                render_value(&mut out, v, format, options, mapping)?;
            }
        }

        out.push_str(&options.sequence_epilogue);
    }

    writer.write_all(out.as_bytes())?;
    Ok(())
}

/// 把`[t_begin, t_end)`裁剪到`[0, width)`；倒置区间收缩为空
fn clip_range(t_begin: i64, t_end: i64, width: usize) -> (usize, usize) {
    let t0 = t_begin.clamp(0, width as i64) as usize;
    let t1 = t_end.clamp(0, width as i64) as usize;
    (t0, t1.max(t0))
}

fn render_value(
    out: &mut String,
    v: f32,
    format: ValueFormat,
    options: &WriteFormattingOptions,
    mapping: Option<&LabelMapping>,
) -> Result<(), WriteError> {
    match format {
        ValueFormat::Float => out.push_str(&format_float(v, &options.precision_format)),
        ValueFormat::CategoryIndex => out.push_str(&format!("{}", v as usize)),
        ValueFormat::CategoryLabel => {
            // mapping 在进入此格式前已验证非空
            let mapping = mapping.ok_or_else(|| {
                WriteError::InvalidConfig("字符串解码需要标签表".to_string())
            })?;
            out.push_str(mapping.label(v as usize)?);
        }
    }
    Ok(())
}
