use tabular_mdp::{
    algo::{QLearningConfig, SolverConfig, ValueIteration},
    decay,
    env::Mdp,
    exploration::EpsilonGreedy,
    gym::{FLAction, FrozenLake},
    occupancy_measure, policy_evaluation,
    table::{PolicyTable, ValueTable},
};

const GAMMA: f64 = 0.95;
const NUM_EPISODES: usize = 20000;

fn print_grid(title: &str, lake: &FrozenLake, values: &ValueTable<usize>) {
    println!("{title}");
    for row in 0..lake.height() {
        let line: Vec<String> = (0..lake.width())
            .map(|col| format!("{:6.3}", values.get(&(row * lake.width() + col))))
            .collect();
        println!("  {}", line.join(" "));
    }
}

fn print_policy(lake: &FrozenLake, policy: &PolicyTable<usize>) {
    println!("Greedy policy");
    for row in 0..lake.height() {
        let line: String = (0..lake.width())
            .map(|col| {
                let s = row * lake.width() + col;
                if lake.is_terminal(&s) {
                    return '.';
                }
                match policy.action(&s).and_then(FLAction::from_index) {
                    Some(FLAction::Left) => '<',
                    Some(FLAction::Down) => 'v',
                    Some(FLAction::Right) => '>',
                    Some(FLAction::Up) => '^',
                    None => '?',
                }
            })
            .collect();
        println!("  {line}");
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let lake = FrozenLake::new().slippery(true);

    let uniform = PolicyTable::uniform(lake.states(), lake.num_actions());
    let v_uniform = policy_evaluation(&lake, &uniform, GAMMA, 1e-8, 10_000);
    print_grid("Uniform random policy", &lake, &v_uniform);

    let (v_star, q_star, report) =
        ValueIteration::new(SolverConfig::new(GAMMA, 1e-8, 10_000)).run(&lake);
    println!("Value iteration took {} sweeps", report.iterations);
    print_grid("Optimal values", &lake, &v_star);

    let optimal = PolicyTable::greedy(&q_star);
    print_policy(&lake, &optimal);

    let occupancy = occupancy_measure(&lake, &optimal, GAMMA, 1e-8, 10_000);
    print_grid("Discounted visits under the optimal policy", &lake, &occupancy);

    let config = QLearningConfig {
        alpha: 0.05,
        gamma: GAMMA,
        exploration: EpsilonGreedy::new(decay::Exponential::new(5e-4, 1.0, 0.05).unwrap()),
        num_episodes: NUM_EPISODES,
        max_steps_per_episode: 200,
        seed: Some(0),
    };
    let (q, v, training) = config.run(&lake);
    let wins = training.returns.iter().rev().take(1000).filter(|&&r| r > 0.0).count();
    println!("Q-learning reached the goal in {wins} of the last 1000 episodes");
    print_grid("Learned values", &lake, &v);
    print_policy(&lake, &PolicyTable::greedy(&q));
}
