/*
 * @Author       : 老董
 * @Date         : 2026-08-12
 * @Description  : Graph 核心操作 + 代标记（generation）前向传播
 */

use super::{Graph, GraphError};
use crate::data::MbLayout;
use crate::nn::nodes::{NodeHandle, NodeType};
use crate::nn::NodeId;
use crate::tensor::Tensor;
use std::collections::{HashMap, HashSet};

impl Graph {
    // ========== 创建 ==========

    pub fn new() -> Self {
        Self::with_name("default_graph")
    }

    pub fn with_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nodes: HashMap::new(),
            forward_edges: HashMap::new(),
            backward_edges: HashMap::new(),
            // 代号从1起，新节点的标记0天然无效
            last_forward_pass_id: 1,
            default_outputs: Vec::new(),
            eval_order: Vec::new(),
            next_id: 0,
            is_eval_mode: false,
        }
    }

    // ========== 基础访问器 ==========

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    pub fn nodes_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn get_node(&self, id: NodeId) -> Result<&NodeHandle, GraphError> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    pub(in crate::nn) fn get_node_mut(&mut self, id: NodeId) -> Result<&mut NodeHandle, GraphError> {
        self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))
    }

    /// 按名称查找节点
    pub fn get_node_by_name(&self, name: &str) -> Result<NodeId, GraphError> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name() == name)
            .map(|(&id, _)| id)
            .ok_or_else(|| GraphError::NodeNameNotFound(name.to_string()))
    }

    pub fn get_node_name(&self, id: NodeId) -> Result<&str, GraphError> {
        Ok(self.get_node(id)?.name())
    }

    pub fn get_node_parents(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        // 先检查节点是否存在
        let _ = self.get_node(id)?;
        Ok(self.backward_edges.get(&id).cloned().unwrap_or_default())
    }

    pub fn get_node_children(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        // 先检查节点是否存在
        let _ = self.get_node(id)?;
        Ok(self.forward_edges.get(&id).cloned().unwrap_or_default())
    }

    pub fn has_node_value(&self, id: NodeId) -> Result<bool, GraphError> {
        Ok(self.get_node(id)?.has_value())
    }

    pub fn get_node_value(&self, id: NodeId) -> Result<Option<&Tensor>, GraphError> {
        Ok(self.get_node(id)?.value())
    }

    pub fn set_node_value(&mut self, id: NodeId, value: Option<&Tensor>) -> Result<(), GraphError> {
        self.get_node_mut(id)?.set_value(value)
    }

    pub fn get_node_grad(&self, id: NodeId) -> Result<Option<&Tensor>, GraphError> {
        Ok(self.get_node(id)?.grad())
    }

    pub fn get_node_layout(&self, id: NodeId) -> Result<Option<&MbLayout>, GraphError> {
        Ok(self.get_node(id)?.layout())
    }

    pub fn set_node_layout(
        &mut self,
        id: NodeId,
        layout: Option<MbLayout>,
    ) -> Result<(), GraphError> {
        self.get_node_mut(id)?.set_layout(layout);
        Ok(())
    }

    pub fn is_input_node(&self, id: NodeId) -> Result<bool, GraphError> {
        Ok(matches!(self.get_node(id)?.node_type(), NodeType::Input(_)))
    }

    pub fn is_parameter_node(&self, id: NodeId) -> Result<bool, GraphError> {
        Ok(matches!(
            self.get_node(id)?.node_type(),
            NodeType::Parameter(_)
        ))
    }

    // ========== 默认输出节点 ==========

    /// 把节点注册为图声明的默认输出（按声明顺序，去重）
    pub fn declare_output(&mut self, id: NodeId) -> Result<(), GraphError> {
        let _ = self.get_node(id)?;
        if !self.default_outputs.contains(&id) {
            self.default_outputs.push(id);
        }
        Ok(())
    }

    pub fn default_outputs(&self) -> &[NodeId] {
        &self.default_outputs
    }

    // ========== ID/名称生成 ==========

    pub(in crate::nn::graph) fn generate_valid_node_id(&mut self) -> NodeId {
        // 先递增再返回，所以第一个节点 ID 是 1
        self.next_id += 1;
        NodeId(self.next_id)
    }

    pub(in crate::nn::graph) fn check_duplicate_node_name(
        &self,
        name: &str,
    ) -> Result<(), GraphError> {
        if self.nodes.values().any(|node| node.name() == name) {
            return Err(GraphError::DuplicateNodeName(name.to_string()));
        }
        Ok(())
    }

    pub(in crate::nn::graph) fn generate_valid_new_node_name(
        &self,
        base_name: &str,
        node_type: &str,
    ) -> Result<String, GraphError> {
        if !base_name.is_empty() {
            self.check_duplicate_node_name(base_name)?;
            return Ok(base_name.to_string());
        }

        let mut counter = 1;
        loop {
            let name = format!("{node_type}_{counter}");
            if self.check_duplicate_node_name(&name).is_ok() {
                return Ok(name);
            }
            counter += 1;
        }
    }

    // ========== 前向传播 ==========

    /// 进入新的求值代：使所有节点的缓存值失效。驱动层每个小批量调用一次。
    pub fn bump_eval_generation(&mut self) {
        self.last_forward_pass_id += 1;
    }

    /// 以`node_id`为根前向传播。同一求值代内已算过的节点直接复用缓存值，
    /// 因此多个输出共享的子图在一个小批量里至多计算一次。
    pub fn forward(&mut self, node_id: NodeId) -> Result<(), GraphError> {
        let pass_id = self.last_forward_pass_id;
        self.forward_node_internal(node_id, pass_id)
    }

    fn forward_node_internal(&mut self, node_id: NodeId, pass_id: u64) -> Result<(), GraphError> {
        let node = self.get_node_mut(node_id)?;

        match node.node_type() {
            NodeType::Input(_) | NodeType::Parameter(_) => {
                // 源节点：值由外部设置，有值即视为本代有效
                if node.has_value() {
                    node.set_last_forward_pass_id(pass_id);
                    return Ok(());
                }
                return Err(GraphError::ComputationError(format!(
                    "{node}没有值，无法前向传播"
                )));
            }
            _ => {
                if node.last_forward_pass_id() == pass_id {
                    return Ok(());
                }
            }
        }

        let parents_ids = self.get_node_parents(node_id)?;
        for parent_id in &parents_ids {
            self.forward_node_internal(*parent_id, pass_id)?;
        }

        let parent_nodes = parents_ids
            .iter()
            .map(|id| self.get_node(*id).cloned())
            .collect::<Result<Vec<NodeHandle>, _>>()?;

        // 布局沿前向传播继承：取第一个带布局的父节点
        let inherited_layout = parent_nodes
            .iter()
            .find_map(|parent| parent.layout().cloned());

        let node = self.get_node_mut(node_id)?;
        node.calc_value_by_parents(&parent_nodes)?;
        node.set_layout(inherited_layout);
        node.set_last_forward_pass_id(pass_id);

        Ok(())
    }

    // ========== 依赖闭包与缓冲区预分配 ==========

    /// 以`roots`为根、沿父边的依赖闭包（首次遇见顺序，含根自身）
    pub fn dependency_closure(&self, roots: &[NodeId]) -> Result<Vec<NodeId>, GraphError> {
        fn dfs(
            graph: &Graph,
            node_id: NodeId,
            visited: &mut HashSet<NodeId>,
            result: &mut Vec<NodeId>,
        ) -> Result<(), GraphError> {
            if !visited.insert(node_id) {
                return Ok(());
            }
            result.push(node_id);
            for parent_id in graph.get_node_parents(node_id)? {
                dfs(graph, parent_id, visited, result)?;
            }
            Ok(())
        }

        let mut result = Vec::new();
        let mut visited = HashSet::new();
        for &root in roots {
            dfs(self, root, &mut visited, &mut result)?;
        }
        Ok(result)
    }

    /// `root`可达的全部可学习参数节点（首次遇见顺序）
    pub fn learnable_param_nodes(&self, root: NodeId) -> Result<Vec<NodeId>, GraphError> {
        Ok(self
            .dependency_closure(&[root])?
            .into_iter()
            .filter(|&id| {
                self.nodes
                    .get(&id)
                    .is_some_and(NodeHandle::is_trainable)
            })
            .collect())
    }

    /// 为一次求值运行预分配/清理缓冲区：释放闭包内中间节点的陈旧值；
    /// 当`grad_root`给定时，同时清理闭包内所有梯度缓冲（为反向传播腾位）。
    pub fn allocate_matrices(
        &mut self,
        outputs: &[NodeId],
        grad_root: Option<NodeId>,
    ) -> Result<(), GraphError> {
        let mut roots = outputs.to_vec();
        if let Some(root) = grad_root {
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
        let closure = self.dependency_closure(&roots)?;

        for id in closure {
            let node = self.get_node_mut(id)?;
            match node.node_type() {
                NodeType::Input(_) | NodeType::Parameter(_) => {}
                _ => node.clear_value()?,
            }
            if grad_root.is_some() {
                node.clear_grad()?;
            }
        }
        Ok(())
    }
}
