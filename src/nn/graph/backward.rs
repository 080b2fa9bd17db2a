/*
 * @Author       : 老董
 * @Date         : 2026-08-12
 * @Description  : Graph VJP 反向传播
 */

use super::{Graph, GraphError};
use crate::nn::nodes::NodeType;
use crate::nn::NodeId;
use crate::tensor::Tensor;
use std::collections::HashSet;

impl Graph {
    /// 以`root`为根反向传播，为闭包内所有可存储梯度的节点填充梯度缓冲。
    ///
    /// 根节点的梯度以全一张量播种（把根当作准则节点看待），随后按
    /// “子节点先于父节点”的拓扑顺序做 VJP 累加。
    pub fn backward_from(&mut self, root: NodeId) -> Result<(), GraphError> {
        if !self.is_train_mode() {
            eprintln!("[only_eval 警告] 在推理模式下调用 backward，这通常是误用。");
        }

        let root_node = self.get_node(root)?;
        let root_value = root_node.value().ok_or_else(|| {
            GraphError::ComputationError(format!("{root_node}没有值，请先执行 forward"))
        })?;
        let seed = Tensor::ones(root_value.shape());

        // 上一小批量的梯度对本小批量无意义，先清空
        let topo_order = self.topological_sort_backward(root)?;
        for &node_id in &topo_order {
            self.get_node_mut(node_id)?.clear_grad()?;
        }

        self.get_node_mut(root)?.set_grad(Some(&seed))?;

        for &node_id in &topo_order {
            self.propagate_grad_to_parents(node_id)?;
        }

        Ok(())
    }

    /// 将梯度从当前节点传播到其父节点
    fn propagate_grad_to_parents(&mut self, node_id: NodeId) -> Result<(), GraphError> {
        let parent_ids = self.get_node_parents(node_id)?;
        if parent_ids.is_empty() {
            return Ok(());
        }

        let parent_grads: Vec<(NodeId, Tensor)> = {
            let node = self.get_node(node_id)?;
            let upstream_grad = match node.grad() {
                Some(g) => g.clone(),
                // 本节点未收到梯度（不在根的反向路径上），无可传播
                None => return Ok(()),
            };

            let mut grads = Vec::with_capacity(parent_ids.len());
            for parent_id in &parent_ids {
                let parent = self.get_node(*parent_id)?;

                // 输入节点不存储梯度
                if let NodeType::Input(_) = parent.node_type() {
                    continue;
                }

                let assistant_parent_id =
                    parent_ids.iter().find(|&&id| id != *parent_id).copied();
                let assistant = assistant_parent_id
                    .map(|id| self.get_node(id))
                    .transpose()?;

                let parent_grad = node.calc_grad_to_parent(parent, &upstream_grad, assistant)?;
                grads.push((*parent_id, parent_grad));
            }
            grads
        };

        for (parent_id, parent_grad) in parent_grads {
            let parent_node = self.get_node_mut(parent_id)?;
            if let Some(existing_grad) = parent_node.grad() {
                let new_grad = existing_grad + &parent_grad;
                parent_node.set_grad(Some(&new_grad))?;
            } else {
                parent_node.set_grad(Some(&parent_grad))?;
            }
        }

        Ok(())
    }

    /// 反向传播用的拓扑顺序：根的依赖闭包，子节点先于父节点。
    /// （沿父边做后序 DFS 再反转：每个节点都排在它闭包内所有子节点之后的反面）
    fn topological_sort_backward(&self, root: NodeId) -> Result<Vec<NodeId>, GraphError> {
        fn dfs(
            graph: &Graph,
            node_id: NodeId,
            visited: &mut HashSet<NodeId>,
            result: &mut Vec<NodeId>,
        ) -> Result<(), GraphError> {
            if !visited.insert(node_id) {
                return Ok(());
            }
            for parent_id in graph.get_node_parents(node_id)? {
                dfs(graph, parent_id, visited, result)?;
            }
            result.push(node_id);
            Ok(())
        }

        let mut result = Vec::new();
        let mut visited = HashSet::new();
        dfs(self, root, &mut visited, &mut result)?;
        result.reverse();
        Ok(result)
    }

    /// 清除所有节点的梯度
    pub fn clear_grad(&mut self) -> Result<(), GraphError> {
        for node in self.nodes.values_mut() {
            node.clear_grad()?;
        }
        Ok(())
    }
}
