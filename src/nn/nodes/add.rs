/*
 * @Author       : 老董
 * @Date         : 2026-08-12
 * @Description  : Add 节点：逐元素相加
 */

use super::{GraphError, NodeHandle, TraitNode};
use crate::tensor::Tensor;

#[derive(Clone)]
pub(in crate::nn) struct Add {
    name: Option<String>,
    value: Option<Tensor>,
    grad: Option<Tensor>,
}

impl Add {
    pub(in crate::nn) fn new(parents_count: usize) -> Result<Self, GraphError> {
        if parents_count < 2 {
            return Err(GraphError::InvalidOperation(
                "Add节点至少需要2个父节点".to_string(),
            ));
        }
        Ok(Self {
            name: None,
            value: None,
            grad: None,
        })
    }
}

impl TraitNode for Add {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("<未命名>")
    }

    fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn calc_value_by_parents(&mut self, parents: &[NodeHandle]) -> Result<(), GraphError> {
        let mut result: Option<Tensor> = None;
        for parent in parents {
            let parent_value = parent.value().ok_or_else(|| {
                GraphError::ComputationError(format!(
                    "Add节点'{}'的父节点{}没有值",
                    self.name(),
                    parent
                ))
            })?;
            match &mut result {
                None => result = Some(parent_value.clone()),
                Some(sum) => {
                    if sum.shape() != parent_value.shape() {
                        return Err(GraphError::ShapeMismatch {
                            expected: sum.shape().to_vec(),
                            got: parent_value.shape().to_vec(),
                            message: format!("Add节点'{}'的所有父节点形状必须相同", self.name()),
                        });
                    }
                    *sum += parent_value;
                }
            }
        }
        self.value = result;
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
        // 相加对每个父节点的局部梯度都是 1
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
