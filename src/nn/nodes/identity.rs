/*
 * Identity 节点（恒等映射）
 *
 * forward: y = x（直接传递父节点的值）
 * backward: 直接传递上游梯度（局部梯度 = 1）
 *
 * 对前向数值完全无扰动，因此被诊断模式用作“梯度探针”：在原节点与其所有
 * 子节点之间插入一个 Identity，反向传播时探针自身会收到与原节点输出
 * 等价的梯度，并可独立寻址、独立写出。
 */

use super::{GraphError, NodeHandle, TraitNode};
use crate::tensor::Tensor;

#[derive(Clone)]
pub(in crate::nn) struct Identity {
    name: Option<String>,
    value: Option<Tensor>,
    grad: Option<Tensor>,
}

impl Identity {
    pub(in crate::nn) fn new() -> Self {
        Self {
            name: None,
            value: None,
            grad: None,
        }
    }
}

impl TraitNode for Identity {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("<未命名>")
    }

    fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn calc_value_by_parents(&mut self, parents: &[NodeHandle]) -> Result<(), GraphError> {
        if parents.len() != 1 {
            return Err(GraphError::InvalidOperation(
                "Identity节点只需要1个父节点".to_string(),
            ));
        }
        let parent_value = parents[0].value().ok_or_else(|| {
            GraphError::ComputationError(format!(
                "Identity节点'{}'的父节点{}没有值",
                self.name(),
                parents[0]
            ))
        })?;
        self.value = Some(parent_value.clone());
        Ok(())
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn clear_value(&mut self) -> Result<(), GraphError> {
        self.value = None;
        Ok(())
    }

    fn calc_grad_to_parent(
        &self,
        _target_parent: &NodeHandle,
        upstream_grad: &Tensor,
        _assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError> {
        // Identity 的局部梯度是 1，直接透传上游梯度
        Ok(upstream_grad.clone())
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError> {
        self.grad = grad.cloned();
        Ok(())
    }
}
