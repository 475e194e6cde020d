use clap::{Parser, Subcommand};
use crud_admin::{
    config::AppConfig,
    db,
    error::ActionError,
    models::{ProductForm, UserForm},
    AppState,
};

#[derive(Parser)]
#[command(name = "crud-admin-cli")]
#[command(about = "CLI tool for managing users and products", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Product catalog commands
    Product {
        #[command(subcommand)]
        command: ProductCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List all users, newest first
    List,

    /// Create a new user
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        /// user, admin or editor
        #[arg(short, long, default_value = "user")]
        role: String,
    },

    /// Delete a user by id
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum ProductCommands {
    /// List the catalog, newest first
    List,

    /// Create a new product
    Create {
        #[arg(short, long)]
        name: String,

        /// Price with up to two decimals, e.g. 12.50
        #[arg(short, long)]
        price: String,

        #[arg(short, long, default_value = "0")]
        stock: String,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        image_url: Option<String>,
    },

    /// Delete a product by id
    Delete { id: i64 },
}

fn fail(context: &str, err: ActionError) -> ! {
    match err {
        ActionError::Validation(errors) => {
            eprintln!("❌ {}:", context);
            for field in errors.field_names() {
                for message in errors.messages(field) {
                    eprintln!("  {}: {}", field, message);
                }
            }
        }
        other => eprintln!("❌ {}: {}", context, other),
    }
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    let state = AppState::new(pool, &config);

    // Parse CLI arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::User { command } => match command {
            UserCommands::List => match state.user_service.list_users().await {
                Ok(users) if users.is_empty() => println!("No users registered yet."),
                Ok(users) => {
                    println!(
                        "{:<5} {:<25} {:<35} {:<8} {:<20}",
                        "ID", "Name", "Email", "Role", "Created"
                    );
                    println!("{}", "-".repeat(95));
                    for user in users {
                        println!(
                            "{:<5} {:<25} {:<35} {:<8} {:<20}",
                            user.id,
                            user.name,
                            user.email,
                            user.role,
                            user.created_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
                Err(err) => fail("Failed to list users", err),
            },

            UserCommands::Create { name, email, role } => {
                let form = UserForm {
                    name,
                    email,
                    role,
                    ..UserForm::default()
                };

                match state.user_service.create_user(&form).await {
                    Ok(user) => {
                        println!("✅ User created successfully!");
                        println!("  ID: {}", user.id);
                        println!("  Email: {}", user.email);
                        println!("  Role: {}", user.role);
                    }
                    Err(err) => fail("Failed to create user", err),
                }
            }

            UserCommands::Delete { id } => match state.user_service.delete_user(id).await {
                Ok(()) => println!("✅ User {} deleted successfully!", id),
                Err(ActionError::NotFound) => {
                    eprintln!("❌ User {} not found", id);
                    std::process::exit(1);
                }
                Err(err) => fail("Failed to delete user", err),
            },
        },

        Commands::Product { command } => match command {
            ProductCommands::List => match state.product_service.list_products().await {
                Ok(products) if products.is_empty() => println!("No products in the catalog yet."),
                Ok(products) => {
                    println!(
                        "{:<5} {:<30} {:>10} {:>7} {:<20}",
                        "ID", "Name", "Price", "Stock", "Updated"
                    );
                    println!("{}", "-".repeat(76));
                    for product in products {
                        println!(
                            "{:<5} {:<30} {:>10.2} {:>7} {:<20}",
                            product.id,
                            product.name,
                            product.price,
                            product.stock,
                            product.updated_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
                Err(err) => fail("Failed to list products", err),
            },

            ProductCommands::Create {
                name,
                price,
                stock,
                description,
                image_url,
            } => {
                let form = ProductForm {
                    name,
                    price,
                    stock,
                    description: description.unwrap_or_default(),
                    image_url: image_url.unwrap_or_default(),
                    ..ProductForm::default()
                };

                match state.product_service.create_product(&form).await {
                    Ok(product) => {
                        println!("✅ Product created successfully!");
                        println!("  ID: {}", product.id);
                        println!("  Name: {}", product.name);
                        println!("  Price: {:.2}", product.price);
                        println!("  Stock: {}", product.stock);
                    }
                    Err(err) => fail("Failed to create product", err),
                }
            }

            ProductCommands::Delete { id } => {
                match state.product_service.delete_product(id).await {
                    Ok(()) => println!("✅ Product {} deleted successfully!", id),
                    Err(ActionError::NotFound) => {
                        eprintln!("❌ Product {} not found", id);
                        std::process::exit(1);
                    }
                    Err(err) => fail("Failed to delete product", err),
                }
            }
        },
    }

    Ok(())
}
