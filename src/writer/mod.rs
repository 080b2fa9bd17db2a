/*
 * @Author       : 老董
 * @Date         : 2026-08-13
 * @Description  : writer - 输出求值与序列化引擎
 *                 职责链：节点解析 → 输入绑定 → 小批量循环（前向/可选反向）
 *                 → 序列感知格式化 → 输出流落盘
 */

mod binder;
mod driver;
mod error;
mod format;
mod labels;
mod options;
mod resolver;
mod rewrite;
mod streams;

pub use binder::InputBindings;
pub use driver::{OutputWriter, WriteSummary};
pub use error::WriteError;
pub use format::write_node_buffer;
pub use labels::LabelMapping;
pub use options::{ValueFormat, WriteFormattingOptions};
pub use resolver::{resolve_input_closure, resolve_output_nodes};
pub use rewrite::expose_gradients;
pub use streams::OutputStreamManager;

#[cfg(test)]
mod tests;
