//! Dequantization Benchmark Suite
//!
//! Decode throughput of every quantized layout plus the dense F16/BF16
//! conversions, over a 1024x1024 tensor each.
//!
//! Run with: `cargo bench --bench dequant_bench`

use gguf_theta::tensor::{DType, PrimitiveTensor, QuantizedLayout};
use std::hint::black_box;
use std::time::{Duration, Instant};

// ============================================================================
// Benchmark Harness
// ============================================================================

struct Benchmark {
    name: String,
    iterations: usize,
    warmup_iterations: usize,
}

impl Benchmark {
    fn new(name: &str, iterations: usize) -> Self {
        Benchmark {
            name: name.to_string(),
            iterations,
            warmup_iterations: iterations.min(5),
        }
    }

    fn run_time<F, R>(&self, mut f: F) -> BenchmarkResult
    where
        F: FnMut() -> R,
    {
        for _ in 0..self.warmup_iterations {
            black_box(f());
        }

        let mut durations = Vec::with_capacity(self.iterations);
        for _ in 0..self.iterations {
            let start = Instant::now();
            black_box(f());
            durations.push(start.elapsed());
        }

        BenchmarkResult {
            name: self.name.clone(),
            durations,
        }
    }
}

struct BenchmarkResult {
    name: String,
    durations: Vec<Duration>,
}

impl BenchmarkResult {
    fn avg_ms(&self) -> f64 {
        let total: Duration = self.durations.iter().sum();
        total.as_secs_f64() * 1000.0 / self.durations.len() as f64
    }

    fn percentile(&self, p: usize) -> Duration {
        let mut sorted = self.durations.clone();
        sorted.sort();
        sorted[(sorted.len() * p / 100).min(sorted.len() - 1)]
    }

    fn report_throughput(&self, element_count: usize, input_bytes: usize) {
        let avg_sec = self.avg_ms() / 1000.0;
        println!("\n=== {} ===", self.name);
        println!("Average: {:.3} ms", self.avg_ms());
        println!("P50:     {:?}", self.percentile(50));
        println!("P95:     {:?}", self.percentile(95));
        println!("Throughput:       {:.2} million elements/sec", element_count as f64 / avg_sec / 1e6);
        println!("Input Bandwidth:  {:.2} GB/sec", input_bytes as f64 / avg_sec / 1e9);
        println!("Output Bandwidth: {:.2} GB/sec", (element_count * 4) as f64 / avg_sec / 1e9);
    }
}

// ============================================================================
// Test Data Generation
// ============================================================================

const TENSOR_SIZE: usize = 1024;
const TOTAL_ELEMENTS: usize = TENSOR_SIZE * TENSOR_SIZE;
const ITERATIONS: usize = 20;

/// Byte offsets of the f16 scale fields inside one block
fn scale_offsets(layout: QuantizedLayout) -> Vec<usize> {
    match layout {
        QuantizedLayout::Q8_0 => vec![0],
        QuantizedLayout::Q6_K => vec![layout.block_bytes() - 2],
        QuantizedLayout::Q4_1 | QuantizedLayout::Q4_K | QuantizedLayout::Q5_K => vec![0, 2],
    }
}

fn create_blocks(layout: QuantizedLayout) -> Vec<u8> {
    let blocks = TOTAL_ELEMENTS / layout.block_size();
    let block_bytes = layout.block_bytes();
    let scale = half::f16::from_f32(0.01).to_bits().to_le_bytes();

    let mut data: Vec<u8> = (0..blocks * block_bytes).map(|i| (i * 31 % 251) as u8).collect();
    for block in data.chunks_exact_mut(block_bytes) {
        for &offset in &scale_offsets(layout) {
            block[offset..offset + 2].copy_from_slice(&scale);
        }
    }
    data
}

fn create_half_tensor(dtype: DType) -> PrimitiveTensor {
    let bytes: Vec<u8> = (0..TOTAL_ELEMENTS)
        .flat_map(|i| {
            let v = (i as f32 * 0.001).sin();
            match dtype {
                DType::BF16 => half::bf16::from_f32(v).to_bits().to_le_bytes(),
                _ => half::f16::from_f32(v).to_bits().to_le_bytes(),
            }
        })
        .collect();
    PrimitiveTensor::from_bytes(bytes, dtype, &[TENSOR_SIZE, TENSOR_SIZE])
        .unwrap_or_else(|e| panic!("failed to build {} tensor: {}", dtype, e))
}

// ============================================================================
// Benchmarks
// ============================================================================

fn benchmark_layout(layout: QuantizedLayout) {
    let data = create_blocks(layout);
    let bench = Benchmark::new(&format!("{} dequantize", layout), ITERATIONS);
    let result = bench.run_time(|| layout.dequantize_bytes(&data));
    result.report_throughput(TOTAL_ELEMENTS, data.len());
}

fn benchmark_dense(dtype: DType) {
    let tensor = create_half_tensor(dtype);
    let bench = Benchmark::new(&format!("{} to f32", dtype), ITERATIONS);
    let result = bench.run_time(|| tensor.to_f32_vec());
    result.report_throughput(TOTAL_ELEMENTS, tensor.nbytes());
}

fn main() {
    println!("Dequantization benchmark: {} elements per tensor", TOTAL_ELEMENTS);

    benchmark_dense(DType::F16);
    benchmark_dense(DType::BF16);
    for layout in QuantizedLayout::ALL {
        benchmark_layout(layout);
    }
}
