/*
 * @Author       : 老董
 * @Date         : 2026-08-12
 * @Description  : Graph - 计算图的核心实现
 *
 * 各 impl 块分散在子模块中：
 * - core.rs: 基础访问 + 代标记前向传播 + 缓冲区预分配
 * - backward.rs: VJP 反向传播
 * - builders.rs: new_*_node + 结构编辑（边重定向、求值顺序重算）
 * - mode.rs: 推理/训练模式的作用域切换
 */

mod backward;
mod builders;
mod core;
mod error;
mod mode;

pub use error::GraphError;

use crate::nn::nodes::NodeHandle;
use crate::nn::NodeId;
use std::collections::HashMap;

/// 计算图：持有节点表与显式的正/反向边表。
///
/// 节点归图所有；评估引擎（`crate::writer`）只通过 `NodeId` 引用节点。
pub struct Graph {
    name: String,
    nodes: HashMap<NodeId, NodeHandle>,
    /// 正向边：parent_id -> child_ids（父节点指向子节点）
    forward_edges: HashMap<NodeId, Vec<NodeId>>,
    /// 反向边：child_id -> parent_ids（子节点指向父节点）
    backward_edges: HashMap<NodeId, Vec<NodeId>>,
    /// 当前求值代（generation）。每个小批量递增一次，使所有缓存值失效
    last_forward_pass_id: u64,
    /// 图声明的默认输出节点（按声明顺序）
    default_outputs: Vec<NodeId>,
    /// 结构编辑后由 `compile` 重算的拓扑求值顺序
    eval_order: Vec<NodeId>,
    next_id: u64,
    is_eval_mode: bool,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
