/*
 * @Author       : 老董
 * @Date         : 2026-08-14
 * @Description  : 端到端测试：从构图、灌数据到格式化落盘的完整写出流程，
 *                 覆盖普通模式与梯度暴露诊断模式
 */
use only_eval::data::PackedSequenceSource;
use only_eval::nn::Graph;
use only_eval::tensor::Tensor;
use only_eval::writer::{OutputWriter, WriteFormattingOptions};
use std::fs;

/// y = w(1x2) × x(2xT)，权重固定便于核对数值
fn build_graph() -> Graph {
    let mut graph = Graph::with_name("e2e");
    let x = graph.new_input_node(2, Some("features")).unwrap();
    let w = graph.new_parameter_node(&[1, 2], Some("w")).unwrap();
    let y = graph.new_mat_mul_node(w, x, Some("score")).unwrap();
    graph
        .set_node_value(w, Some(&Tensor::new(&[1.0, 2.0], &[1, 2])))
        .unwrap();
    graph.declare_output(y).unwrap();
    graph
}

fn make_source() -> PackedSequenceSource {
    // 两条变长序列：长度3和长度2，行维2
    PackedSequenceSource::new(vec![(
        "features".to_string(),
        vec![
            Tensor::new(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]),
            Tensor::new(&[10.0, 20.0, 30.0, 40.0], &[2, 2]),
        ],
    )])
    .unwrap()
}

#[test]
fn test_end_to_end_sequence_stream() {
    let mut graph = build_graph();
    let mut source = make_source();

    let options = WriteFormattingOptions {
        sequence_separator: "\\n---\\n".to_string(),
        sequence_epilogue: String::new(),
        ..Default::default()
    };
    // 配置里的转义序列按节点处理一次后才生效
    let base = "temp_e2e_stream";
    let summary = OutputWriter::new(&mut graph)
        .with_verbosity(0)
        .write_output(&mut source, 10, base, &[], &options, None, false)
        .unwrap();

    assert_eq!(summary.total_samples, 5);
    assert_eq!(summary.minibatches, 2);

    // 每个时间步 y = 1*x0 + 2*x1：
    // 序列1: [1,2]→5, [3,4]→11, [5,6]→17；序列2: [10,20]→50, [30,40]→110
    let path = format!("{base}.score");
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text, "5\n11\n17\n---\n50\n110");
    fs::remove_file(&path).unwrap();
}

#[test]
fn test_end_to_end_category_labels() {
    // 标签表文件：行号即类别下标
    let mapping_path = "temp_e2e_labels.txt";
    fs::write(mapping_path, "negative\npositive\n").unwrap();

    let mut graph = Graph::with_name("labels");
    let x = graph.new_input_node(2, Some("features")).unwrap();
    let y = graph.new_identity_node(x, Some("decision")).unwrap();
    graph.declare_output(y).unwrap();

    let mut source = PackedSequenceSource::new(vec![(
        "features".to_string(),
        vec![Tensor::new(&[0.9, 0.1, 0.2, 0.8], &[2, 2])],
    )])
    .unwrap();

    let options = WriteFormattingOptions {
        is_category_label: true,
        label_mapping_file: Some(mapping_path.to_string()),
        sequence_epilogue: String::new(),
        ..Default::default()
    };
    let base = "temp_e2e_category";
    OutputWriter::new(&mut graph)
        .with_verbosity(0)
        .write_output(&mut source, 10, base, &[], &options, None, false)
        .unwrap();

    // t=0列[0.9,0.1]→negative，t=1列[0.2,0.8]→positive
    let path = format!("{base}.decision");
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text, "negative\npositive");

    fs::remove_file(&path).unwrap();
    fs::remove_file(mapping_path).unwrap();
}

#[test]
fn test_end_to_end_diagnostic_gradients() {
    let mut graph = build_graph();
    let mut source = make_source();

    let options = WriteFormattingOptions {
        sequence_separator: "\\n#\\n".to_string(),
        sequence_epilogue: String::new(),
        ..Default::default()
    };
    let base = "temp_e2e_diag";
    OutputWriter::new(&mut graph)
        .with_verbosity(0)
        .write_output(&mut source, 10, base, &[], &options, None, true)
        .unwrap();

    // 前向输出与普通运行一致
    let score = fs::read_to_string(format!("{base}.score")).unwrap();
    assert_eq!(score, "5\n11\n17\n#\n50\n110");

    // 输入抽头的梯度 = wᵀ × 全一上游 = 每个时间步[1, 2]
    let x_grad = fs::read_to_string(format!("{base}.features.grad")).unwrap();
    assert_eq!(x_grad, "1 2\n1 2\n1 2\n#\n1 2\n1 2");

    // 参数抽头存在且有内容（数值 = 各时间步输入之和）
    let w_grad = fs::read_to_string(format!("{base}.w.grad")).unwrap();
    assert!(!w_grad.is_empty());

    for path in [
        format!("{base}.score"),
        format!("{base}.features.grad"),
        format!("{base}.w.grad"),
    ] {
        fs::remove_file(path).unwrap();
    }
}
