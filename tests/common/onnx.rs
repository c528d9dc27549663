//! Tiny ONNX graphs for driving the real runtime in tests.
//!
//! Only the protobuf fields ONNX Runtime needs to load a graph are written:
//! `ModelProto { ir_version, graph, opset_import }` and the graph's nodes,
//! initializers, inputs and outputs.

use digitserve::{INPUT_SIZE, NUM_CLASSES};

pub const INPUT_NAME: &str = "pixels";
pub const OUTPUT_NAME: &str = "logits";

const IR_VERSION: i64 = 7;
const OPSET_VERSION: i64 = 13;
const ELEM_FLOAT: i64 = 1;
const ATTR_INT: i64 = 2;

const PIXELS: usize = (INPUT_SIZE * INPUT_SIZE) as usize;

/// Protobuf message under construction.
#[derive(Default)]
struct Message(Vec<u8>);

impl Message {
    fn varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.0.push((value as u8) | 0x80);
            value >>= 7;
        }
        self.0.push(value as u8);
    }

    fn key(&mut self, field: u32, wire_type: u32) {
        self.varint(u64::from((field << 3) | wire_type));
    }

    fn int(mut self, field: u32, value: i64) -> Self {
        self.key(field, 0);
        self.varint(value as u64);
        self
    }

    fn bytes(mut self, field: u32, data: &[u8]) -> Self {
        self.key(field, 2);
        self.varint(data.len() as u64);
        self.0.extend_from_slice(data);
        self
    }

    fn string(self, field: u32, value: &str) -> Self {
        self.bytes(field, value.as_bytes())
    }

    fn message(self, field: u32, inner: Message) -> Self {
        self.bytes(field, &inner.0)
    }
}

fn float_tensor_info(name: &str, dims: &[i64]) -> Message {
    let shape = dims.iter().fold(Message::default(), |shape, &dim| {
        shape.message(1, Message::default().int(1, dim))
    });
    let tensor_type = Message::default().int(1, ELEM_FLOAT).message(2, shape);
    let type_proto = Message::default().message(1, tensor_type);
    Message::default().string(1, name).message(2, type_proto)
}

fn initializer(name: &str, dims: &[i64], values: &[f32]) -> Message {
    let raw: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    dims.iter()
        .fold(Message::default(), |tensor, &dim| tensor.int(1, dim))
        .int(2, ELEM_FLOAT)
        .string(8, name)
        .bytes(9, &raw)
}

fn node(op_type: &str, inputs: &[&str], outputs: &[&str]) -> Message {
    let node = inputs
        .iter()
        .fold(Message::default(), |node, input| node.string(1, input));
    outputs
        .iter()
        .fold(node, |node, output| node.string(2, output))
        .string(4, op_type)
}

fn int_attribute(name: &str, value: i64) -> Message {
    Message::default()
        .string(1, name)
        .int(3, value)
        .int(20, ATTR_INT)
}

fn model(graph: Message) -> Vec<u8> {
    Message::default()
        .int(1, IR_VERSION)
        .message(7, graph)
        .message(8, Message::default().int(2, OPSET_VERSION))
        .0
}

fn input_dims() -> [i64; 4] {
    let size = i64::from(INPUT_SIZE);
    [1, 1, size, size]
}

/// `Flatten -> Gemm(weights, bias) [-> activation]`, mapping `(1, 1, 28, 28)`
/// to `(1, 10)`. `weights` is row-major `[784, 10]`.
fn dense_classifier(weights: &[f32], bias: &[f32], activation: Option<&str>) -> Vec<u8> {
    let classes = NUM_CLASSES as i64;
    let dense_out = if activation.is_some() { "dense" } else { OUTPUT_NAME };

    let mut graph = Message::default()
        .string(2, "digits")
        .message(
            1,
            node("Flatten", &[INPUT_NAME], &["flat"]).message(5, int_attribute("axis", 1)),
        )
        .message(1, node("Gemm", &["flat", "weight", "bias"], &[dense_out]));
    if let Some(op_type) = activation {
        graph = graph.message(1, node(op_type, &[dense_out], &[OUTPUT_NAME]));
    }

    model(
        graph
            .message(5, initializer("weight", &[PIXELS as i64, classes], weights))
            .message(5, initializer("bias", &[classes], bias))
            .message(11, float_tensor_info(INPUT_NAME, &input_dims()))
            .message(12, float_tensor_info(OUTPUT_NAME, &[1, classes])),
    )
}

/// Logit `i` is `i * (mean - 0.5)`: bright images score 9, dark images 0.
pub fn brightness_classifier() -> Vec<u8> {
    let mut weights = vec![0.0f32; PIXELS * NUM_CLASSES];
    for row in weights.chunks_mut(NUM_CLASSES) {
        for (digit, w) in row.iter_mut().enumerate() {
            *w = digit as f32 / PIXELS as f32;
        }
    }
    let bias: Vec<f32> = (0..NUM_CLASSES).map(|digit| -0.5 * digit as f32).collect();
    dense_classifier(&weights, &bias, None)
}

/// Every logit is `sqrt(-1)`.
pub fn nan_classifier() -> Vec<u8> {
    let weights = vec![0.0f32; PIXELS * NUM_CLASSES];
    let bias = vec![-1.0f32; NUM_CLASSES];
    dense_classifier(&weights, &bias, Some("Sqrt"))
}

/// A three-channel identity graph, not a digit classifier.
pub fn rgb_identity() -> Vec<u8> {
    let size = i64::from(INPUT_SIZE);
    let dims = [1, 3, size, size];
    let graph = Message::default()
        .string(2, "rgb_identity")
        .message(1, node("Identity", &[INPUT_NAME], &[OUTPUT_NAME]))
        .message(11, float_tensor_info(INPUT_NAME, &dims))
        .message(12, float_tensor_info(OUTPUT_NAME, &dims));
    model(graph)
}
