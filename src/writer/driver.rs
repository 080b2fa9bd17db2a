/*
 * @Author       : 老董
 * @Date         : 2026-08-13
 * @Description  : 求值驱动：组合解析/绑定/格式化/流管理为完整的小批量循环
 */

use super::{
    expose_gradients, resolve_input_closure, resolve_output_nodes, write_node_buffer,
    InputBindings, LabelMapping, OutputStreamManager, WriteError, WriteFormattingOptions,
};
use crate::data::MinibatchSource;
use crate::nn::{Graph, NodeId};

/// 一次写出运行的汇总
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    /// 累计处理的样本数
    pub total_samples: usize,
    /// 写出的小批量数
    pub minibatches: usize,
}

/// 输出写出器：驱动`空闲 → 循环初始化 → {取批 → 前向 → [反向] → 写出
/// → 批间通知}* → 完成`的状态推进，任何致命条件直接以错误返回。
pub struct OutputWriter<'g> {
    graph: &'g mut Graph,
    verbosity: u64,
}

impl<'g> OutputWriter<'g> {
    pub fn new(graph: &'g mut Graph) -> Self {
        Self {
            graph,
            verbosity: 1,
        }
    }

    /// 0 = 完全安静；>=1 时打印小批量轨迹、进度与最终汇总
    pub fn with_verbosity(mut self, verbosity: u64) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// 主入口：在数据源耗尽（或样本预算用完）前反复取批、求值并写出。
    ///
    /// `diagnostic`开启梯度暴露改写：要求恰好一个输出节点（多给只用
    /// 第一个），每个被跟踪节点的梯度经由恒等抽头获得独立目的流；
    /// 前向输出数值与非诊断运行逐位一致。
    pub fn write_output(
        &mut self,
        source: &mut dyn MinibatchSource,
        mb_size: usize,
        output_path: &str,
        output_node_names: &[String],
        options: &WriteFormattingOptions,
        sample_budget: Option<usize>,
        diagnostic: bool,
    ) -> Result<WriteSummary, WriteError> {
        // ========== 循环初始化 ==========

        if output_node_names.is_empty() && self.verbosity > 0 {
            eprintln!("未指定输出节点名，使用图声明的默认输出");
        }
        let outputs = resolve_output_nodes(self.graph, output_node_names)?;

        let (grad_root, taps, outputs) = if diagnostic {
            let (root, taps) = expose_gradients(self.graph, &outputs)?;
            (Some(root), taps, vec![root])
        } else {
            (None, Vec::new(), outputs)
        };

        let input_nodes = resolve_input_closure(self.graph, &outputs)?;
        let bindings = InputBindings::bind_inputs(self.graph, &input_nodes)?;

        let mapping = load_mapping(options)?;

        // 输出节点与梯度抽头各占一个目的流
        let mut stream_nodes = outputs.clone();
        stream_nodes.extend_from_slice(&taps);
        let mut streams = OutputStreamManager::open(self.graph, &stream_nodes, output_path)?;

        self.graph.allocate_matrices(&outputs, grad_root)?;

        streams.write_prologue(self.graph, options)?;

        source.start_minibatch_loop(mb_size, 0, sample_budget);
        if !source.supports_multi_sequences() {
            source.set_num_parallel_sequences(1);
        }

        // 运行期间图处于推断模式（诊断模式需要梯度，保持训练模式）；
        // 作用域切换保证无论成败都恢复先前模式
        let verbosity = self.verbosity;
        let summary = self.graph.scoped_mode(!diagnostic, |graph| {
            run_loop(
                graph,
                source,
                &bindings,
                &outputs,
                grad_root,
                &taps,
                &mut streams,
                options,
                mapping.as_ref(),
                verbosity,
            )
        })?;

        streams.write_epilogue(self.graph, options)?;
        streams.flush_all()?;

        if self.verbosity > 0 {
            eprintln!(
                "已写出到 {output_path}.*，共{}个小批量、{}个样本",
                summary.minibatches, summary.total_samples
            );
        }
        Ok(summary)
    }

    /// 只用图中现有的输入值做一次前向并写出，不经过数据源
    pub fn write_current(
        &mut self,
        output_path: &str,
        output_node_names: &[String],
        options: &WriteFormattingOptions,
    ) -> Result<WriteSummary, WriteError> {
        let outputs = resolve_output_nodes(self.graph, output_node_names)?;
        let mapping = load_mapping(options)?;
        let mut streams = OutputStreamManager::open(self.graph, &outputs, output_path)?;

        self.graph.allocate_matrices(&outputs, None)?;
        streams.write_prologue(self.graph, options)?;

        self.graph.scoped_mode(true, |graph| {
            graph.bump_eval_generation();
            for &id in &outputs {
                graph.forward(id)?;
            }
            emit_forward(graph, &outputs, &mut streams, options, mapping.as_ref(), 0)
        })?;

        streams.write_epilogue(self.graph, options)?;
        streams.flush_all()?;

        let total_samples = match outputs.first() {
            Some(&id) => self
                .graph
                .get_node_layout(id)?
                .map_or(1, crate::data::MbLayout::num_samples),
            None => 0,
        };
        Ok(WriteSummary {
            total_samples,
            minibatches: 1,
        })
    }
}

fn load_mapping(options: &WriteFormattingOptions) -> Result<Option<LabelMapping>, WriteError> {
    match (&options.label_mapping_file, options.is_category_label) {
        (Some(path), true) => Ok(Some(LabelMapping::load(path)?)),
        _ => Ok(None),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_loop(
    graph: &mut Graph,
    source: &mut dyn MinibatchSource,
    bindings: &InputBindings,
    outputs: &[NodeId],
    grad_root: Option<NodeId>,
    taps: &[NodeId],
    streams: &mut OutputStreamManager,
    options: &WriteFormattingOptions,
    mapping: Option<&LabelMapping>,
    verbosity: u64,
) -> Result<WriteSummary, WriteError> {
    let mut total_samples = 0;
    let mut num_mbs_run = 0;

    loop {
        // ========== 取批 ==========
        let actual_mb_size = source.next_minibatch(graph, bindings)?;
        if actual_mb_size == 0 {
            // 数据耗尽是正常终止而非错误
            break;
        }

        // ========== 前向（可选反向） ==========
        // 每个小批量推进一次求值代，使全部缓存值失效；
        // 多个输出共享的子图在本代内至多算一次
        graph.bump_eval_generation();
        for &id in outputs {
            graph.forward(id)?;
            if let Some(root) = grad_root {
                graph.backward_from(root)?;
            }
        }

        // ========== 写出 ==========
        emit_forward(graph, outputs, streams, options, mapping, num_mbs_run)?;
        emit_gradients(graph, taps, streams, options, mapping, num_mbs_run)?;

        total_samples += actual_mb_size;
        num_mbs_run += 1;

        if verbosity > 0 {
            eprintln!("Minibatch[{num_mbs_run}]: 本批样本数 = {actual_mb_size}");
            // 纯观察性的进度汇报，每100个小批量一条
            if num_mbs_run % 100 == 0 {
                eprintln!("已评估{num_mbs_run}个小批量，累计样本数 = {total_samples}");
            }
        }

        // ========== 批间通知 ==========
        source.data_end();
    }

    Ok(WriteSummary {
        total_samples,
        minibatches: num_mbs_run,
    })
}

/// 逐输出节点把前向值交给格式化器再落到各自目的流
fn emit_forward(
    graph: &Graph,
    outputs: &[NodeId],
    streams: &mut OutputStreamManager,
    options: &WriteFormattingOptions,
    mapping: Option<&LabelMapping>,
    num_mbs_run: usize,
) -> Result<(), WriteError> {
    for &id in outputs {
        let name = graph.get_node_name(id)?.to_string();
        let processed = options.processed(&name);
        let value = graph
            .get_node_value(id)?
            .ok_or_else(|| WriteError::InvalidConfig(format!("输出节点'{name}'没有前向值")))?;
        let layout = graph.get_node_layout(id)?;
        write_node_buffer(
            streams.writer(id)?,
            &name,
            value,
            layout,
            &processed,
            mapping,
            num_mbs_run,
        )?;
    }
    Ok(())
}

/// 逐抽头写出梯度；梯度缺失降级为警告（反向传播未到达该节点）
fn emit_gradients(
    graph: &Graph,
    taps: &[NodeId],
    streams: &mut OutputStreamManager,
    options: &WriteFormattingOptions,
    mapping: Option<&LabelMapping>,
    num_mbs_run: usize,
) -> Result<(), WriteError> {
    for &id in taps {
        let name = graph.get_node_name(id)?.to_string();
        match graph.get_node_grad(id)? {
            Some(grad) => {
                let processed = options.processed(&name);
                let layout = graph.get_node_layout(id)?;
                write_node_buffer(
                    streams.writer(id)?,
                    &name,
                    grad,
                    layout,
                    &processed,
                    mapping,
                    num_mbs_run,
                )?;
            }
            None => {
                eprintln!("[only_eval 警告] 节点'{name}'的梯度为空，反向传播未到达它");
            }
        }
    }
    Ok(())
}
