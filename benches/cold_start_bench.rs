// Supervisor overhead benchmark
// Measures one execute() round trip: workspace creation, spawn, wait, capture, cleanup.
// Target: shell no-op p50 < 50ms, p95 < 100ms

use execbox::{ExecutionConfig, Runtime, Supervisor};
use std::process::Command;
use std::time::{Duration, Instant};

const ITERATIONS: usize = 100;
const WARMUP_ITERATIONS: usize = 10;

struct LatencyStats {
    p50: Duration,
    p95: Duration,
    p99: Duration,
    min: Duration,
    max: Duration,
    mean: Duration,
}

impl LatencyStats {
    fn from_samples(mut samples: Vec<Duration>) -> Self {
        samples.sort();
        let len = samples.len();

        let p50_idx = (len as f64 * 0.50) as usize;
        let p95_idx = (len as f64 * 0.95) as usize;
        let p99_idx = (len as f64 * 0.99) as usize;

        let sum: Duration = samples.iter().sum();
        let mean = sum / len as u32;

        Self {
            p50: samples[p50_idx],
            p95: samples[p95_idx],
            p99: samples[p99_idx],
            min: samples[0],
            max: samples[len - 1],
            mean,
        }
    }

    fn print(&self) {
        println!("  p50: {:?}", self.p50);
        println!("  p95: {:?}", self.p95);
        println!("  p99: {:?}", self.p99);
        println!("  min: {:?}", self.min);
        println!("  max: {:?}", self.max);
        println!("  mean: {:?}", self.mean);
    }
}

struct Scenario {
    name: &'static str,
    runtime: Runtime,
    code: &'static str,
    p50_budget: Duration,
    p95_budget: Duration,
}

fn measure(scenario: &Scenario) -> bool {
    let root = std::env::temp_dir().join("execbox-bench");
    let config = ExecutionConfig::default()
        .with_runtime(scenario.runtime.clone())
        .with_workspace_root(root);
    let supervisor = Supervisor::new(config);

    for _ in 0..WARMUP_ITERATIONS {
        supervisor.execute(scenario.code);
    }

    let mut samples = Vec::with_capacity(ITERATIONS);
    for _ in 0..ITERATIONS {
        let start = Instant::now();
        let result = supervisor.execute(scenario.code);
        samples.push(start.elapsed());
        if !result.success {
            println!("\n=== {} ===\n❌ FAIL: {}", scenario.name, result.stderr);
            return false;
        }
    }

    let stats = LatencyStats::from_samples(samples);
    println!("\n=== {} ===", scenario.name);
    stats.print();

    let passed = stats.p50 < scenario.p50_budget && stats.p95 < scenario.p95_budget;
    if passed {
        println!("✅ PASS");
    } else {
        println!(
            "❌ FAIL: p50={:?} (target <{:?}), p95={:?} (target <{:?})",
            stats.p50, scenario.p50_budget, stats.p95, scenario.p95_budget
        );
    }
    passed
}

fn python_available() -> bool {
    Command::new("python3")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn main() {
    println!("=== execbox Supervisor Benchmark ===");
    println!("Iterations: {} (after {} warmup)", ITERATIONS, WARMUP_ITERATIONS);

    let mut scenarios = vec![Scenario {
        name: "Shell no-op",
        runtime: Runtime {
            program: "sh".to_string(),
            args: Vec::new(),
            source_name: "main.sh".to_string(),
            module_path_var: "EXECBOX_MODULE_PATH".to_string(),
        },
        code: "true",
        p50_budget: Duration::from_millis(50),
        p95_budget: Duration::from_millis(100),
    }];

    if python_available() {
        // interpreter startup dominates
        scenarios.push(Scenario {
            name: "Python Hello World",
            runtime: Runtime::python("python3"),
            code: r#"print("Hello, World!")"#,
            p50_budget: Duration::from_millis(150),
            p95_budget: Duration::from_millis(300),
        });
    }

    let results: Vec<bool> = scenarios.iter().map(measure).collect();
    let passed_count = results.iter().filter(|passed| **passed).count();

    println!("\n=== Summary ===");
    println!("{}/{} scenarios passed", passed_count, results.len());

    if passed_count == results.len() {
        println!("✅ All latency budgets met");
        std::process::exit(0);
    } else {
        println!("❌ Some latency budgets exceeded");
        std::process::exit(1);
    }
}
