use collatz_tree::*;
use std::env;
use std::io::{self, BufWriter, Write as IoWrite};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    eprintln!("上限付き逆コラッツ木の構築と列レイアウト");
    eprintln!();
    eprintln!("使い方:");
    eprintln!("  collatz-tree tree <N>                          木の概要を表示");
    eprintln!("  collatz-tree layout <N> [spacing] [ratio]      レイアウトを CSV で標準出力へ");
    eprintln!("  collatz-tree verify <start> <end> [--no-crossings]");
    eprintln!("                                                 上限 start..=end の全木を並列検証");
    eprintln!();
    eprintln!("N は [{}, {}] に丸められます。ログは RUST_LOG で制御します。", MIN_BOUND, MAX_BOUND);
    eprintln!();
    eprintln!("例:");
    eprintln!("  collatz-tree tree 1000");
    eprintln!("  collatz-tree layout 100 80 0.3 > layout.csv");
    eprintln!("  collatz-tree verify 4 5000");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "tree" => cmd_tree(&args[2..]),
        "layout" => cmd_layout(&args[2..]),
        "verify" => cmd_verify(&args[2..]),
        _ => {
            eprintln!("不明なコマンド: {}", args[1]);
            print_usage();
        }
    }
}

fn parse_n(s: &str) -> u64 {
    let n = parse_bound(s).unwrap_or_else(|e| {
        eprintln!("N を解析できません: {}", e);
        std::process::exit(1);
    });
    if s.trim() != n.to_string() {
        eprintln!("N = {} に丸めました", n);
    }
    n
}

fn parse_f64(args: &[String], default: f64) -> f64 {
    if args.is_empty() {
        return default;
    }
    args[0].parse::<f64>().unwrap_or_else(|_| {
        eprintln!("数値を解析できません: {}", args[0]);
        std::process::exit(1);
    })
}

fn build_or_exit(n: u64) -> CollatzTree {
    build_tree(n).unwrap_or_else(|e| {
        eprintln!("木を構築できません: {}", e);
        std::process::exit(1);
    })
}

fn cmd_tree(args: &[String]) {
    if args.is_empty() {
        eprintln!("使い方: collatz-tree tree <N>");
        return;
    }
    let n = parse_n(&args[0]);

    let timer = Instant::now();
    let tree = build_or_exit(n);
    let elapsed = timer.elapsed();
    let s = tree.summary();

    println!("N = {}", n);
    println!();
    println!("--- 木 ---");
    println!("ノード数          = {}", s.nodes);
    println!("幹の長さ          = {} (1 → {})", s.trunk_len, s.trunk_max);
    println!("葉の数            = {}", s.leaves);
    println!("奇数枝の数        = {}", s.odd_branches);
    println!("最大深さ          = {}", s.depth);
    println!("構築時間          = {:?}", elapsed);
}

fn cmd_layout(args: &[String]) {
    if args.is_empty() {
        eprintln!("使い方: collatz-tree layout <N> [spacing] [ratio]");
        return;
    }
    let n = parse_n(&args[0]);
    let defaults = LayoutConfig::default();
    let spacing = parse_f64(&args[1..], defaults.h_spacing());
    let ratio = parse_f64(args.get(2..).unwrap_or(&[]), defaults.diagonal_ratio());
    let config = LayoutConfig::new(spacing, defaults.v_scale(), ratio).unwrap_or_else(|e| {
        eprintln!("レイアウト設定が不正です: {}", e);
        std::process::exit(1);
    });

    let tree = build_or_exit(n);
    let layout = compute_layout_with(&tree, &config);

    let stdout = io::stdout();
    let mut w = BufWriter::new(stdout.lock());
    if let Err(e) = write_csv(&layout, &mut w) {
        // パイプを閉じられた場合など
        tracing::debug!(%e, "stopped writing layout csv");
    }
}

fn write_csv(layout: &LayoutResult, w: &mut impl IoWrite) -> io::Result<()> {
    writeln!(w, "value,column,x,y,trunk,leaf,has_odd_child,is_odd_child")?;
    for p in &layout.nodes {
        writeln!(
            w,
            "{},{},{},{},{},{},{},{}",
            p.value, p.column, p.x, p.y, p.is_trunk, p.is_leaf, p.has_odd_child, p.is_odd_child
        )?;
    }
    w.flush()
}

fn cmd_verify(args: &[String]) {
    if args.len() < 2 {
        eprintln!("使い方: collatz-tree verify <start> <end> [--no-crossings]");
        return;
    }
    let start = parse_n(&args[0]);
    let end = parse_n(&args[1]);
    let check_crossings = !args[2..].iter().any(|a| a == "--no-crossings");

    let num_threads = rayon::current_num_threads();
    println!("範囲検証: N = [{}, {}]", start, end);
    println!(
        "(交差判定{}、{}スレッド並列)",
        if check_crossings { "あり" } else { "なし" },
        num_threads
    );
    println!();

    let timer = Instant::now();
    let last_print = std::sync::Mutex::new(Instant::now());
    let result = verify_range_parallel(start, end, &LayoutConfig::default(), check_crossings, |done, total| {
        let now = Instant::now();
        if let Ok(mut lp) = last_print.try_lock() {
            if now.duration_since(*lp).as_millis() >= 500 || done == total {
                let elapsed = timer.elapsed();
                let pct = done as f64 / total as f64 * 100.0;
                eprint!(
                    "\x1b[2K\r  [{:.1}s] {}/{} ({:.1}%)",
                    elapsed.as_secs_f64(),
                    done,
                    total,
                    pct
                );
                *lp = now;
            }
        }
    });
    let elapsed = timer.elapsed();
    eprintln!();

    let result = result.unwrap_or_else(|e| {
        eprintln!("検証できません: {}", e);
        std::process::exit(1);
    });

    println!("--- 結果 ---");
    println!("検証した上限値の数  = {}", result.total_checked);
    println!("全て合格            = {}", if result.all_passed { "はい" } else { "いいえ" });
    println!("最大ノード数        = {} (N={})", result.max_nodes, result.max_nodes_bound);
    println!("最大列数            = {}", result.max_columns);
    println!("計算時間            = {:?}", elapsed);

    if !result.failures.is_empty() {
        println!("違反のあった上限値  = {} 個", result.failures.len());
        for report in result.failures.iter().take(10) {
            for v in &report.violations {
                println!("  N={}: {}", report.max, v);
            }
        }
        std::process::exit(1);
    }
}
