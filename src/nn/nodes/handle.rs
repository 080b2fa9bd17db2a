/*
 * @Author       : 老董
 * @Date         : 2026-08-12
 * @Description  : NodeHandle - 包裹具体节点并携带 id/求值代标记/布局等运行时状态
 */

use super::{GraphError, NodeId, NodeType, TraitNode};
use crate::data::MbLayout;
use crate::tensor::Tensor;
use std::fmt;

#[derive(Clone)]
pub struct NodeHandle {
    id: Option<NodeId>,
    raw_node: NodeType,
    /// 最后一次成功计算该节点值的求值代（generation）。
    /// 与图的当前代相等时，缓存值有效（同一小批量内共享子图只计算一次）。
    last_forward_pass_id: u64,
    /// 诊断模式下的梯度探针会被标记为“始终参与反向传播”，避免被任何剪枝跳过
    always_backward: bool,
    /// 本节点当前值对应的小批量布局（由数据源设置/沿前向传播继承）
    layout: Option<MbLayout>,
}

impl NodeHandle {
    pub(in crate::nn) fn new<T: Into<NodeType>>(raw_node: T) -> Self {
        Self {
            id: None,
            raw_node: raw_node.into(),
            last_forward_pass_id: 0,
            always_backward: false,
            layout: None,
        }
    }

    pub(in crate::nn) fn bind_id_and_name(&mut self, id: NodeId, name: &str) {
        self.id = Some(id);
        self.raw_node.set_name(name);
    }

    pub fn id(&self) -> NodeId {
        self.id.expect("节点尚未加入图中")
    }

    pub fn name(&self) -> &str {
        self.raw_node.name()
    }

    pub(in crate::nn) fn node_type(&self) -> &NodeType {
        &self.raw_node
    }

    // ========== 值/梯度 ==========

    pub fn value(&self) -> Option<&Tensor> {
        self.raw_node.value()
    }

    pub fn has_value(&self) -> bool {
        self.raw_node.value().is_some()
    }

    pub(in crate::nn) fn set_value(&mut self, value: Option<&Tensor>) -> Result<(), GraphError> {
        self.raw_node.set_value(value)
    }

    pub(in crate::nn) fn clear_value(&mut self) -> Result<(), GraphError> {
        self.raw_node.clear_value()
    }

    pub fn grad(&self) -> Option<&Tensor> {
        self.raw_node.grad()
    }

    pub(in crate::nn) fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError> {
        self.raw_node.set_grad(grad)
    }

    pub(in crate::nn) fn clear_grad(&mut self) -> Result<(), GraphError> {
        self.raw_node.clear_grad()
    }

    pub fn is_trainable(&self) -> bool {
        self.raw_node.is_trainable()
    }

    // ========== 计算委托 ==========

    pub(in crate::nn) fn calc_value_by_parents(
        &mut self,
        parents: &[NodeHandle],
    ) -> Result<(), GraphError> {
        self.raw_node.calc_value_by_parents(parents)
    }

    pub(in crate::nn) fn calc_grad_to_parent(
        &self,
        target_parent: &NodeHandle,
        upstream_grad: &Tensor,
        assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError> {
        self.raw_node
            .calc_grad_to_parent(target_parent, upstream_grad, assistant_parent)
    }

    /// 父节点被替换（边重定向）后，同步需要记住父节点顺序的节点类型
    pub(in crate::nn) fn replace_parent_id(&mut self, old: NodeId, new: NodeId) {
        if let NodeType::MatMul(mat_mul) = &mut self.raw_node {
            mat_mul.replace_parent_id(old, new);
        }
    }

    // ========== 运行时状态 ==========

    pub(in crate::nn) const fn last_forward_pass_id(&self) -> u64 {
        self.last_forward_pass_id
    }

    pub(in crate::nn) fn set_last_forward_pass_id(&mut self, id: u64) {
        self.last_forward_pass_id = id;
    }

    pub const fn is_always_backward(&self) -> bool {
        self.always_backward
    }

    pub(in crate::nn) fn set_always_backward(&mut self, always: bool) {
        self.always_backward = always;
    }

    pub fn layout(&self) -> Option<&MbLayout> {
        self.layout.as_ref()
    }

    pub(in crate::nn) fn set_layout(&mut self, layout: Option<MbLayout>) {
        self.layout = layout;
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "节点[{}(id={})]", self.name(), id.0),
            None => write!(f, "节点[{}(未绑定)]", self.name()),
        }
    }
}
