/*
 * @Author       : 老董
 * @Date         : 2026-08-12
 * @Description  : MatMul 节点：矩阵乘法 C = A x B
 */

use super::{GraphError, NodeHandle, NodeId, TraitNode};
use crate::tensor::Tensor;

#[derive(Clone)]
pub(in crate::nn) struct MatMul {
    name: Option<String>,
    value: Option<Tensor>,
    grad: Option<Tensor>,
    parents_ids: Vec<NodeId>, // NOTE: 注意顺序，[A, B]
}

impl MatMul {
    pub(in crate::nn) fn new(parents_ids: &[NodeId]) -> Result<Self, GraphError> {
        if parents_ids.len() != 2 {
            return Err(GraphError::InvalidOperation(
                "MatMul节点需要恰好2个父节点".to_string(),
            ));
        }
        Ok(Self {
            name: None,
            value: None,
            grad: None,
            parents_ids: parents_ids.to_vec(),
        })
    }

    /// 父节点被替换（如插入梯度探针）后同步记录的父节点顺序
    pub(in crate::nn) fn replace_parent_id(&mut self, old: NodeId, new: NodeId) {
        for id in &mut self.parents_ids {
            if *id == old {
                *id = new;
            }
        }
    }
}

impl TraitNode for MatMul {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("<未命名>")
    }

    fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn calc_value_by_parents(&mut self, parents: &[NodeHandle]) -> Result<(), GraphError> {
        let a = parents[0].value().ok_or_else(|| {
            GraphError::ComputationError(format!("MatMul节点'{}'的第一个父节点没有值", self.name()))
        })?;
        let b = parents[1].value().ok_or_else(|| {
            GraphError::ComputationError(format!("MatMul节点'{}'的第二个父节点没有值", self.name()))
        })?;

        if a.shape()[1] != b.shape()[0] {
            return Err(GraphError::ShapeMismatch {
                expected: vec![a.shape()[0], b.shape()[1]],
                got: vec![a.shape()[1], b.shape()[0]],
                message: format!(
                    "MatMul节点'{}'的两个父节点形状不兼容：父节点1的列数({})与父节点2的行数({})不相等",
                    self.name(),
                    a.shape()[1],
                    b.shape()[0],
                ),
            });
        }

        self.value = Some(a.mat_mul(b));
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
        target_parent: &NodeHandle,
        upstream_grad: &Tensor,
        assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError> {
        let other = assistant_parent.ok_or_else(|| {
            GraphError::ComputationError("MatMul反向传播需要另一个父节点的值".to_string())
        })?;
        let other_value = other.value().ok_or_else(|| {
            GraphError::ComputationError(format!("MatMul节点'{}'的父节点{other}没有值", self.name()))
        })?;

        // C = A x B：dL/dA = dL/dC x B^T；dL/dB = A^T x dL/dC
        if target_parent.id() == self.parents_ids[0] {
            Ok(upstream_grad.mat_mul(&other_value.transpose()))
        } else if target_parent.id() == self.parents_ids[1] {
            Ok(other_value.transpose().mat_mul(upstream_grad))
        } else {
            Err(GraphError::ComputationError(format!(
                "{target_parent}不是MatMul节点'{}'的父节点",
                self.name()
            )))
        }
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError> {
        self.grad = grad.cloned();
        Ok(())
    }
}
