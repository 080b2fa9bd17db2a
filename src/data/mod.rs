//! 小批量数据模块
//!
//! 提供打包变长序列批次的布局描述（[`MbLayout`]）、评估驱动层消费的
//! 数据源接口（[`MinibatchSource`]）以及一个内存打包实现
//! （[`PackedSequenceSource`]）。
//!
//! 打包约定：一个小批量缓冲是行维 × (并行槽位 × 时间宽度) 的2阶张量，
//! 时间上列主序——时间步`t`、槽位`s`的列号为 `s + t × 槽位数`。

mod error;
mod layout;
mod source;

pub use error::DataError;
pub use layout::{MbLayout, SequenceInfo};
pub use source::{MinibatchSource, PackedSequenceSource};

#[cfg(test)]
mod tests;
