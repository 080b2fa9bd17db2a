use super::plain_options;
use crate::data::PackedSequenceSource;
use crate::nn::Graph;
use crate::tensor::Tensor;
use crate::writer::OutputWriter;
use std::fs;

/// 输入x → 恒等输出y 的最小图，输出值即输入值
fn build_identity_graph(row_dim: usize) -> Graph {
    let mut graph = Graph::new();
    let x = graph.new_input_node(row_dim, Some("x")).unwrap();
    let y = graph.new_identity_node(x, Some("y")).unwrap();
    graph.declare_output(y).unwrap();
    graph
}

fn build_linear_graph() -> Graph {
    let mut graph = Graph::new();
    let x = graph.new_input_node(1, Some("x")).unwrap();
    let w = graph.new_parameter_node(&[1, 1], Some("w")).unwrap();
    let y = graph.new_mat_mul_node(w, x, Some("y")).unwrap();
    graph
        .set_node_value(w, Some(&Tensor::new(&[3.0], &[1, 1])))
        .unwrap();
    graph.declare_output(y).unwrap();
    graph
}

#[test]
fn test_write_output_continuous_across_minibatches() {
    let mut graph = build_identity_graph(1);
    let mut source = PackedSequenceSource::new(vec![(
        "x".to_string(),
        vec![
            Tensor::new(&[1.0, 2.0], &[1, 2]),
            Tensor::new(&[3.0], &[1, 1]),
        ],
    )])
    .unwrap();

    let mut options = plain_options();
    options.sequence_separator = "\n---\n".to_string();

    let base = "temp_test_write_output_continuous";
    let summary = OutputWriter::new(&mut graph)
        .with_verbosity(0)
        .write_output(&mut source, 2, base, &[], &options, None, false)
        .unwrap();

    assert_eq!(summary.minibatches, 2, "每条序列各占一个小批量");
    assert_eq!(summary.total_samples, 3);

    // 第二个小批量的序列前有分隔符，两批读起来是一条连续的流
    let path = format!("{base}.y");
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text, "1\n2\n---\n3");
    fs::remove_file(&path).unwrap();
}

#[test]
fn test_write_output_respects_sample_budget() {
    let mut graph = build_identity_graph(1);
    let mut source = PackedSequenceSource::new(vec![(
        "x".to_string(),
        vec![
            Tensor::new(&[1.0], &[1, 1]),
            Tensor::new(&[2.0], &[1, 1]),
            Tensor::new(&[3.0], &[1, 1]),
        ],
    )])
    .unwrap();

    let base = "temp_test_write_output_budget";
    let summary = OutputWriter::new(&mut graph)
        .with_verbosity(0)
        .write_output(&mut source, 10, base, &[], &plain_options(), Some(2), false)
        .unwrap();

    assert_eq!(summary.total_samples, 2, "样本预算应截断运行");
    fs::remove_file(format!("{base}.y")).unwrap();
}

#[test]
fn test_write_output_restores_mode_on_completion() {
    let mut graph = build_identity_graph(1);
    let mut source = PackedSequenceSource::new(vec![(
        "x".to_string(),
        vec![Tensor::new(&[1.0], &[1, 1])],
    )])
    .unwrap();

    assert!(graph.is_train_mode());
    let base = "temp_test_write_output_mode";
    OutputWriter::new(&mut graph)
        .with_verbosity(0)
        .write_output(&mut source, 1, base, &[], &plain_options(), None, false)
        .unwrap();
    assert!(graph.is_train_mode(), "运行结束后应恢复先前模式");
    fs::remove_file(format!("{base}.y")).unwrap();
}

#[test]
fn test_write_output_diagnostic_taps_get_own_streams() {
    let mut source = PackedSequenceSource::new(vec![(
        "x".to_string(),
        vec![Tensor::new(&[1.0, 2.0], &[1, 2])],
    )])
    .unwrap();

    // 对照：非诊断运行的前向输出
    let mut plain_graph = build_linear_graph();
    let plain_base = "temp_test_diag_plain";
    OutputWriter::new(&mut plain_graph)
        .with_verbosity(0)
        .write_output(&mut source, 10, plain_base, &[], &plain_options(), None, false)
        .unwrap();
    let plain_y = fs::read_to_string(format!("{plain_base}.y")).unwrap();
    assert_eq!(plain_y, "3\n6");

    let mut source = PackedSequenceSource::new(vec![(
        "x".to_string(),
        vec![Tensor::new(&[1.0, 2.0], &[1, 2])],
    )])
    .unwrap();
    let mut graph = build_linear_graph();
    let base = "temp_test_diag";
    OutputWriter::new(&mut graph)
        .with_verbosity(0)
        .write_output(&mut source, 10, base, &[], &plain_options(), None, true)
        .unwrap();

    // 前向输出与非诊断运行逐位一致
    let diag_y = fs::read_to_string(format!("{base}.y")).unwrap();
    assert_eq!(diag_y, plain_y);

    // 每个被跟踪节点（输入x、参数w）各得一个梯度流：
    // dL/d(x抽头) = wᵀ×1 = [3, 3]；dL/d(w抽头) = 1×xᵀ = [1+2]
    let x_grad = fs::read_to_string(format!("{base}.x.grad")).unwrap();
    assert_eq!(x_grad, "3\n3");
    let w_grad = fs::read_to_string(format!("{base}.w.grad")).unwrap();
    assert_eq!(w_grad, "3");

    for path in [
        format!("{plain_base}.y"),
        format!("{base}.y"),
        format!("{base}.x.grad"),
        format!("{base}.w.grad"),
    ] {
        fs::remove_file(path).unwrap();
    }
}

#[test]
fn test_write_current_uses_existing_values() {
    let mut graph = build_identity_graph(2);
    let x = graph.get_node_by_name("x").unwrap();
    graph
        .set_node_value(x, Some(&Tensor::new(&[7.0, 8.0], &[2, 1])))
        .unwrap();

    let base = "temp_test_write_current";
    let summary = OutputWriter::new(&mut graph)
        .with_verbosity(0)
        .write_current(base, &[], &plain_options())
        .unwrap();
    assert_eq!(summary.minibatches, 1);

    let path = format!("{base}.y");
    let text = fs::read_to_string(&path).unwrap();
    // 无布局按一条长度1的序列处理：一行跨满行维
    assert_eq!(text, "7 8");
    fs::remove_file(&path).unwrap();
}

#[test]
fn test_write_output_prologue_epilogue_once() {
    let mut graph = build_identity_graph(1);
    let mut source = PackedSequenceSource::new(vec![(
        "x".to_string(),
        vec![
            Tensor::new(&[1.0], &[1, 1]),
            Tensor::new(&[2.0], &[1, 1]),
        ],
    )])
    .unwrap();

    let mut options = plain_options();
    options.prologue = "[%s]\n".to_string();
    options.epilogue = "\n<end>".to_string();
    options.sequence_separator = " ".to_string();

    let base = "temp_test_prologue";
    OutputWriter::new(&mut graph)
        .with_verbosity(0)
        .write_output(&mut source, 1, base, &[], &options, None, false)
        .unwrap();

    let path = format!("{base}.y");
    let text = fs::read_to_string(&path).unwrap();
    // 前言/尾声各写一次（%s替换为节点名），两个小批量夹在中间
    assert_eq!(text, "[y]\n1 2\n<end>");
    fs::remove_file(&path).unwrap();
}
