/*
 * @Author       : 老董
 * @Date         : 2026-08-12
 * @Description  : MinibatchSource - 评估驱动层消费的数据源接口 + 内存打包实现
 */

use super::{DataError, MbLayout, SequenceInfo};
use crate::nn::Graph;
use crate::tensor::Tensor;
use crate::writer::InputBindings;

/// 小批量数据源。评估驱动层按“拉”模式消费：每次`next_minibatch`把
/// 绑定的输入节点填好并返回样本数，返回`Ok(0)`表示数据耗尽（正常结束）。
pub trait MinibatchSource {
    /// 循环初始化：批大小、起始偏移、样本预算（None 表示不限）
    fn start_minibatch_loop(&mut self, mb_size: usize, start: usize, sample_budget: Option<usize>);

    /// 拉取下一个小批量：通过图 API 填充绑定节点的值与布局，返回样本数
    fn next_minibatch(
        &mut self,
        graph: &mut Graph,
        bindings: &InputBindings,
    ) -> Result<usize, DataError>;

    /// 小批量边界通知，供数据源做特定善后（如句末处理）
    fn data_end(&mut self) {}

    /// 是否支持一个小批量内并行多条序列
    fn supports_multi_sequences(&self) -> bool {
        true
    }

    /// 并行度提示（不支持多序列的消费方会把它压到1）
    fn set_num_parallel_sequences(&mut self, _hint: usize) {}
}

/// 内存打包数据源：把各输入流的变长序列打包成
/// `[行维, 槽位数 × 宽度]` 的零填充缓冲并生成对应布局。
///
/// 各流的序列按下标一一对应（同一下标是同一个样本的不同输入），
/// 因此要求序列条数一致、且同一下标的序列长度跨流一致。
pub struct PackedSequenceSource {
    /// 每个输入流：名称 + 各序列的 `[dim, len]` 张量
    streams: Vec<(String, Vec<Tensor>)>,
    num_parallel: usize,
    cursor: usize,
    mb_size: usize,
    sample_budget: Option<usize>,
    samples_emitted: usize,
}

impl PackedSequenceSource {
    pub fn new(streams: Vec<(String, Vec<Tensor>)>) -> Result<Self, DataError> {
        let Some((first_name, first_seqs)) = streams.first() else {
            return Err(DataError::SourceError("至少需要一个输入流".to_string()));
        };
        for (name, seqs) in &streams {
            if seqs.len() != first_seqs.len() {
                return Err(DataError::SourceError(format!(
                    "输入流'{name}'的序列条数({})与'{first_name}'({})不一致",
                    seqs.len(),
                    first_seqs.len()
                )));
            }
            for (i, seq) in seqs.iter().enumerate() {
                if seq.dimension() != 2 {
                    return Err(DataError::SourceError(format!(
                        "输入流'{name}'的第{i}条序列应为[行维, 长度]的2阶张量，得到{:?}",
                        seq.shape()
                    )));
                }
                if seq.shape()[1] != first_seqs[i].shape()[1] {
                    return Err(DataError::SourceError(format!(
                        "第{i}条序列的长度在输入流'{name}'与'{first_name}'间不一致"
                    )));
                }
            }
        }
        Ok(Self {
            streams,
            num_parallel: 1,
            cursor: 0,
            mb_size: 1,
            sample_budget: None,
            samples_emitted: 0,
        })
    }

    /// 设置打包槽位数（一个小批量内最多并行多少条序列）
    pub fn with_num_parallel(mut self, num_parallel: usize) -> Self {
        self.num_parallel = num_parallel.max(1);
        self
    }

    fn seq_len(&self, index: usize) -> usize {
        self.streams[0].1[index].shape()[1]
    }

    fn total_sequences(&self) -> usize {
        self.streams[0].1.len()
    }
}

impl MinibatchSource for PackedSequenceSource {
    fn start_minibatch_loop(&mut self, mb_size: usize, start: usize, sample_budget: Option<usize>) {
        self.mb_size = mb_size.max(1);
        self.cursor = start;
        self.sample_budget = sample_budget;
        self.samples_emitted = 0;
    }

    fn next_minibatch(
        &mut self,
        graph: &mut Graph,
        bindings: &InputBindings,
    ) -> Result<usize, DataError> {
        if self.cursor >= self.total_sequences() {
            return Ok(0);
        }
        if let Some(budget) = self.sample_budget {
            if self.samples_emitted >= budget {
                return Ok(0);
            }
        }

        // 贪心装批：槽位够、样本数不超过上限就继续装（至少装一条）；
        // 上限取批大小与剩余预算中较小者
        let cap = match self.sample_budget {
            Some(budget) => self.mb_size.min(budget - self.samples_emitted),
            None => self.mb_size,
        };
        let mut picked = Vec::new();
        let mut samples = 0;
        while self.cursor + picked.len() < self.total_sequences() && picked.len() < self.num_parallel
        {
            let index = self.cursor + picked.len();
            let len = self.seq_len(index);
            if !picked.is_empty() && samples + len > cap {
                break;
            }
            picked.push(index);
            samples += len;
        }

        let slots = picked.len();
        let width = picked.iter().map(|&i| self.seq_len(i)).max().unwrap_or(0);
        let sequences = picked
            .iter()
            .enumerate()
            .map(|(slot, &i)| SequenceInfo {
                slot,
                t_begin: 0,
                t_end: self.seq_len(i) as i64,
            })
            .collect();
        let layout = MbLayout::new(slots, width, sequences)?;

        for (name, seqs) in &self.streams {
            let node_id = bindings
                .get(name)
                .ok_or_else(|| DataError::UnboundStream(name.clone()))?;
            let dim = seqs[picked[0]].shape()[0];

            // 列主序打包：时间步t、槽位s的列号为 s + t*slots
            let mut buffer = Tensor::zeros(&[dim, slots * width]);
            for (slot, &i) in picked.iter().enumerate() {
                let seq = &seqs[i];
                for t in 0..seq.shape()[1] {
                    for row in 0..dim {
                        buffer[[row, slot + t * slots]] = seq[[row, t]];
                    }
                }
            }

            graph.set_node_value(node_id, Some(&buffer))?;
            graph.set_node_layout(node_id, Some(layout.clone()))?;
        }

        self.cursor += slots;
        self.samples_emitted += samples;
        Ok(samples)
    }
}
