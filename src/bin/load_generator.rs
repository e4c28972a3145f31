use clap::Parser;
use orderbook_engine::infrastructure::network::{OrderClient, WireFormat};
use orderbook_engine::shared::protocol::{
    AddOrderRequest, AmendOrderRequest, CancelOrderRequest, ClientMessage, ErrorCode, OrderId,
    ServerMessage, Side,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// 订单簿引擎压测工具
#[derive(Parser, Debug, Clone)]
#[command(name = "load_generator")]
struct Args {
    /// 服务器地址
    #[arg(short, long, default_value = "127.0.0.1:50051")]
    addr: String,

    /// 并发客户端数量
    #[arg(short, long, default_value_t = 8)]
    clients: u32,

    /// 测试持续时间（秒）
    #[arg(short, long, default_value_t = 10)]
    duration: u64,

    /// 消息体编码，需与服务器一致
    #[arg(short, long, value_enum, default_value_t = WireFormat::Json)]
    wire_format: WireFormat,

    /// 中间价
    #[arg(long, default_value_t = 50_000)]
    mid: u64,

    /// 随机种子
    #[arg(long, default_value_t = 7)]
    seed: u64,
}

#[derive(Debug, Default)]
struct ClientStats {
    requests: u64,
    filled_quantity: u64,
    latencies_ns: Vec<u64>,
    errors: HashMap<ErrorCode, u64>,
}

impl ClientStats {
    fn merge(&mut self, other: ClientStats) {
        self.requests += other.requests;
        self.filled_quantity += other.filled_quantity;
        self.latencies_ns.extend(other.latencies_ns);
        for (code, count) in other.errors {
            *self.errors.entry(code).or_default() += count;
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let test_duration = Duration::from_secs(args.duration);

    println!("启动吞吐量测试...");
    println!("服务器地址: {}", args.addr);
    println!("模拟客户端数量: {}", args.clients);
    println!("测试持续时间: {:?}", test_duration);

    let deadline = Instant::now() + test_duration;
    let mut handles = Vec::new();
    for client_id in 0..args.clients {
        let args = args.clone();
        handles.push(tokio::spawn(async move { run_client(client_id, args, deadline).await }));
    }

    let mut total = ClientStats::default();
    for handle in handles {
        match handle.await {
            Ok(stats) => total.merge(stats),
            Err(e) => eprintln!("客户端任务失败: {}", e),
        }
    }

    let throughput = total.requests as f64 / test_duration.as_secs_f64();
    total.latencies_ns.sort_unstable();
    let percentile = |p: f64| -> f64 {
        if total.latencies_ns.is_empty() {
            return 0.0;
        }
        let idx = ((total.latencies_ns.len() - 1) as f64 * p) as usize;
        total.latencies_ns[idx] as f64 / 1000.0
    };
    let avg = if total.latencies_ns.is_empty() {
        0.0
    } else {
        total.latencies_ns.iter().sum::<u64>() as f64 / total.latencies_ns.len() as f64 / 1000.0
    };

    println!("\n--- 测试结果 ---");
    println!("总请求数: {}", total.requests);
    println!("吞吐量 (req/s): {:.2}", throughput);
    println!("成交数量: {}", total.filled_quantity);
    println!("平均延迟: {:.2} µs", avg);
    println!("P50 延迟: {:.2} µs", percentile(0.50));
    println!("P99 延迟: {:.2} µs", percentile(0.99));
    if total.errors.is_empty() {
        println!("错误: 无");
    } else {
        let mut errors: Vec<_> = total.errors.into_iter().collect();
        errors.sort_by_key(|(code, _)| code.as_str());
        for (code, count) in errors {
            println!("错误 {}: {}", code.as_str(), count);
        }
    }
}

async fn run_client(client_id: u32, args: Args, deadline: Instant) -> ClientStats {
    let mut stats = ClientStats::default();
    let mut client = match OrderClient::connect(args.addr.as_str(), args.wire_format).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("[客户端 {}] 连接失败: {}", client_id, e);
            return stats;
        }
    };

    let mut rng = StdRng::seed_from_u64(args.seed.wrapping_add(client_id as u64));
    let mut next_id: OrderId = (client_id as u64) << 32;
    // 本客户端可能仍在簿中的订单
    let mut live: Vec<OrderId> = Vec::new();

    while Instant::now() < deadline {
        let roll: u32 = rng.gen_range(0..100);
        let message = if live.is_empty() || roll < 70 {
            next_id += 1;
            let side = if rng.gen::<bool>() { Side::Bid } else { Side::Ask };
            let price = if rng.gen_range(0..100) < 5 {
                0
            } else {
                match side {
                    Side::Bid => rng.gen_range(args.mid.saturating_sub(10)..=args.mid),
                    Side::Ask => rng.gen_range(args.mid..=args.mid + 10),
                }
            };
            ClientMessage::AddOrder(AddOrderRequest {
                order_id: next_id,
                side,
                price,
                quantity: rng.gen_range(1..=5),
            })
        } else if roll < 85 {
            let order_id = live[rng.gen_range(0..live.len())];
            ClientMessage::AmendOrder(AmendOrderRequest {
                order_id,
                quantity: rng.gen_range(1..=10),
            })
        } else {
            let order_id = live.swap_remove(rng.gen_range(0..live.len()));
            ClientMessage::CancelOrder(CancelOrderRequest { order_id })
        };

        let start = Instant::now();
        let reply = match client.request(&message).await {
            Ok(reply) => reply,
            Err(e) => {
                eprintln!("[客户端 {}] 请求失败: {}", client_id, e);
                break;
            }
        };
        stats.latencies_ns.push(start.elapsed().as_nanos() as u64);
        stats.requests += 1;

        match reply {
            ServerMessage::OrderAccepted(report) => {
                stats.filled_quantity += report.filled_quantity;
                if report.resting {
                    live.push(report.order_id);
                }
            }
            ServerMessage::Error(e) => {
                *stats.errors.entry(e.code).or_default() += 1;
                if e.code == ErrorCode::OrderNotFound {
                    if let ClientMessage::AmendOrder(request) = message {
                        live.retain(|id| *id != request.order_id);
                    }
                }
            }
            _ => {}
        }
    }

    stats
}
