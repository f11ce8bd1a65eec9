use clap::{Parser, Subcommand};

use agromanage::console::{render, ApiClient, LoanBoard, ViewState};
use agromanage::logging;
use agromanage::models::{OrderStatus, Role};

#[derive(Parser, Debug)]
#[command(name = "admin_console", about = "AgroManage administration from the terminal")]
struct Cli {
    /// Base URL of the AgroManage API.
    #[arg(long, env = "AGRO_API_URL", default_value = "http://127.0.0.1:5000")]
    url: String,

    #[arg(long, env = "AGRO_ADMIN_USERNAME", default_value = "admin")]
    username: String,

    #[arg(long, env = "AGRO_ADMIN_PASSWORD")]
    password: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every loan application.
    Loans,
    /// Approve a pending loan, then show the refreshed list.
    Approve { id: i32 },
    /// Reject a pending loan, then show the refreshed list.
    Reject { id: i32 },
    /// List every order.
    Orders,
    /// Move an order to another status.
    OrderStatus { id: i32, status: String },
    Products,
    Weather,
}

#[tokio::main]
async fn main() {
    logging::init();
    let cli = Cli::parse();

    let mut client = ApiClient::new(&cli.url);
    if let Err(e) = client.login(&cli.username, &cli.password, Role::Admin).await {
        eprintln!("login failed: {e}");
        std::process::exit(1);
    }

    let output = match cli.command {
        Command::Loans => {
            let mut board = LoanBoard::new(client);
            board.refresh().await;
            board.render()
        }
        Command::Approve { id } => {
            let mut board = LoanBoard::new(client);
            board.approve(id).await;
            board.render()
        }
        Command::Reject { id } => {
            let mut board = LoanBoard::new(client);
            board.reject(id).await;
            board.render()
        }
        Command::Orders => render(
            &ViewState::from_fetch(client.admin_orders().await, "Failed to load orders"),
            "orders",
        ),
        Command::OrderStatus { id, status } => match status.parse::<OrderStatus>() {
            Ok(status) => match client.update_order_status(id, status).await {
                Ok(()) => render(
                    &ViewState::from_fetch(client.admin_orders().await, "Failed to load orders"),
                    "orders",
                ),
                Err(e) => format!("! Failed to update order status: {e}\n"),
            },
            Err(()) => format!("! unknown order status {status:?}\n"),
        },
        Command::Products => render(
            &ViewState::from_fetch(client.products().await, "Failed to load products"),
            "products",
        ),
        Command::Weather => render(
            &ViewState::from_fetch(client.weather_alerts().await, "Failed to load weather alerts"),
            "weather alerts",
        ),
    };
    print!("{output}");
}
