/*
 * @Author       : 老董
 * @Date         : 2026-08-12
 * @Description  : Graph 节点构建方法（new_*_node）与结构编辑（边重定向、求值顺序重算）
 */

use super::{Graph, GraphError};
use crate::nn::nodes::{Add, Identity, Input, MatMul, NodeHandle, Parameter};
use crate::nn::NodeId;
use std::collections::HashMap;

impl Graph {
    /// 添加节点到节点表并登记边
    fn add_node_to_list(
        &mut self,
        mut node_handle: NodeHandle,
        name: Option<&str>,
        node_type: &str,
        parents: &[NodeId],
    ) -> Result<NodeId, GraphError> {
        for &parent_id in parents {
            let _ = self.get_node(parent_id)?;
        }

        let node_id = self.generate_valid_node_id();
        let node_name = self.generate_valid_new_node_name(name.unwrap_or(""), node_type)?;

        for &parent_id in parents {
            self.forward_edges
                .entry(parent_id)
                .or_default()
                .push(node_id);
        }
        self.backward_edges
            .entry(node_id)
            .or_default()
            .extend(parents);

        node_handle.bind_id_and_name(node_id, &node_name);
        self.nodes.insert(node_id, node_handle);
        Ok(node_id)
    }

    /// 创建输入节点（行维固定，值由数据源逐小批量填充）
    pub fn new_input_node(&mut self, row_dim: usize, name: Option<&str>) -> Result<NodeId, GraphError> {
        let node = NodeHandle::new(Input::new(row_dim)?);
        self.add_node_to_list(node, name, "input", &[])
    }

    /// 创建参数节点（随机初始化，可通过 set_node_value 覆盖）
    pub fn new_parameter_node(
        &mut self,
        shape: &[usize],
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let node = NodeHandle::new(Parameter::new(shape)?);
        self.add_node_to_list(node, name, "parameter", &[])
    }

    /// 创建 Add 节点
    pub fn new_add_node(
        &mut self,
        parents: &[NodeId],
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let node = NodeHandle::new(Add::new(parents.len())?);
        self.add_node_to_list(node, name, "add", parents)
    }

    /// 创建 MatMul 节点
    pub fn new_mat_mul_node(
        &mut self,
        left: NodeId,
        right: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let node = NodeHandle::new(MatMul::new(&[left, right])?);
        self.add_node_to_list(node, name, "mat_mul", &[left, right])
    }

    /// 创建 Identity 节点（恒等映射）
    pub fn new_identity_node(
        &mut self,
        parent: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let node = NodeHandle::new(Identity::new());
        self.add_node_to_list(node, name, "identity", &[parent])
    }

    /// 标记节点始终参与反向传播（梯度探针用，防止被任何剪枝跳过）
    pub fn mark_always_backward(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.get_node_mut(id)?.set_always_backward(true);
        Ok(())
    }

    // ========== 结构编辑 ==========

    /// 把全表中所有以`original`为父节点的边改指到`replacement`
    /// （`replacement`自身的父边除外），并同步重建正向边表。
    ///
    /// 前向数值不受影响的前提是`replacement`对其父节点是恒等映射。
    pub fn redirect_node_children(
        &mut self,
        original: NodeId,
        replacement: NodeId,
    ) -> Result<(), GraphError> {
        let _ = self.get_node(original)?;
        let _ = self.get_node(replacement)?;

        let mut redirected_children = Vec::new();
        for (&child_id, parents) in &mut self.backward_edges {
            if child_id == replacement {
                continue;
            }
            for parent_id in parents.iter_mut() {
                if *parent_id == original {
                    *parent_id = replacement;
                    redirected_children.push(child_id);
                }
            }
        }

        // 记录父节点顺序的节点类型（如 MatMul）同步替换
        for child_id in redirected_children {
            self.get_node_mut(child_id)?
                .replace_parent_id(original, replacement);
        }

        self.rebuild_forward_edges();
        Ok(())
    }

    fn rebuild_forward_edges(&mut self) {
        let mut forward_edges: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut children: Vec<NodeId> = self.backward_edges.keys().copied().collect();
        children.sort();
        for child_id in children {
            for &parent_id in &self.backward_edges[&child_id] {
                forward_edges.entry(parent_id).or_default().push(child_id);
            }
        }
        self.forward_edges = forward_edges;
    }

    /// 结构编辑后重算拓扑求值顺序（父节点先于子节点），有环则报错。
    /// 同时作废所有旧梯度——编辑后的图上它们不再有意义。
    pub fn compile(&mut self) -> Result<(), GraphError> {
        let mut in_degree: HashMap<NodeId, usize> = HashMap::new();
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort();
        for &id in &ids {
            let parents = self.backward_edges.get(&id).map_or(0, Vec::len);
            in_degree.insert(id, parents);
        }

        let mut ready: Vec<NodeId> = ids
            .iter()
            .copied()
            .filter(|id| in_degree[id] == 0)
            .collect();
        let mut order = Vec::with_capacity(ids.len());

        while let Some(id) = ready.pop() {
            order.push(id);
            let mut children = self.forward_edges.get(&id).cloned().unwrap_or_default();
            children.sort();
            for child in children {
                let degree = in_degree
                    .get_mut(&child)
                    .ok_or(GraphError::NodeNotFound(child))?;
                *degree -= 1;
                if *degree == 0 {
                    ready.push(child);
                }
            }
        }

        if order.len() != ids.len() {
            return Err(GraphError::CycleDetected);
        }

        self.eval_order = order;
        self.clear_grad()?;
        Ok(())
    }

    /// 当前拓扑求值顺序（最近一次`compile`的结果）
    pub fn eval_order(&self) -> &[NodeId] {
        &self.eval_order
    }
}
