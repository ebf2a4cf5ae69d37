use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::{FinanceService, NewExpense, NewInstallment, Session};
use crate::domain::{
    format_cents, parse_cents, Category, DateRange, ExpenseUpdate, InstallmentUpdate,
    PaymentMethod, Scope,
};

/// Gastos - Family Expense Tracker
#[derive(Parser)]
#[command(name = "gastos")]
#[command(about = "Track family and personal expenses, installments and budgets")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "GASTOS_DB", default_value = "gastos.db")]
    pub database: String,

    /// Current user id (UUID), required for personal records
    #[arg(short, long, env = "GASTOS_USER", global = true)]
    pub user: Option<String>,

    /// Allow reading and writing family records
    #[arg(long, env = "GASTOS_FAMILY_ACCESS", global = true)]
    pub family_access: bool,

    /// Scope to work on: personal, family
    #[arg(short, long, global = true, default_value = "personal")]
    pub scope: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Expense management commands
    #[command(subcommand)]
    Expense(ExpenseCommands),

    /// Installment plan management commands
    #[command(subcommand)]
    Installment(InstallmentCommands),

    /// Monthly salary for the selected scope
    #[command(subcommand)]
    Salary(SalaryCommands),

    /// Family member management commands
    #[command(subcommand)]
    Member(MemberCommands),

    /// Category budget management commands
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// Category list management commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Spending totals by category and payment method
    Stats {
        #[command(flatten)]
        period: PeriodArgs,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Spending trend, budget and category alerts
    Insights {
        #[command(flatten)]
        period: PeriodArgs,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Six-month spending history
    History {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Income, spending, installments and alerts at a glance
    Dashboard {
        #[command(flatten)]
        period: PeriodArgs,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export: expenses, installments, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Period selection shared by the reporting commands. Defaults to the
/// current month.
#[derive(clap::Args)]
pub struct PeriodArgs {
    /// Month to report on (YYYY-MM)
    #[arg(long, conflicts_with_all = ["from", "to"])]
    month: Option<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    from: Option<String>,

    /// End date (YYYY-MM-DD)
    #[arg(long, requires = "from")]
    to: Option<String>,
}

#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record a new expense
    Add {
        /// Amount spent (e.g., "50.00" or "50,00")
        amount: String,

        /// What the money was spent on
        #[arg(short, long)]
        description: String,

        /// Category key (e.g., "alimentacao", "transporte")
        #[arg(short, long, default_value = "outros")]
        category: String,

        /// Payment method: dinheiro, debito, credito, pix, transferencia
        #[arg(short, long, default_value = "pix")]
        method: String,

        /// Date of the expense (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List expenses
    List {
        #[command(flatten)]
        period: PeriodArgs,

        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Change fields of an expense
    Edit {
        /// Expense ID
        id: String,

        #[arg(short, long)]
        amount: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        method: Option<String>,

        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Notes (empty string clears them)
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Delete an expense
    Delete {
        /// Expense ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum InstallmentCommands {
    /// Create an installment plan
    Add {
        /// Total to split (with --count) or the monthly amount (without)
        amount: String,

        #[arg(short, long)]
        description: String,

        /// Number of installments; omit for an open-ended monthly charge
        #[arg(long)]
        count: Option<u32>,

        #[arg(short, long, default_value = "outros")]
        category: String,

        #[arg(short, long, default_value = "credito")]
        method: String,

        /// Date of the first installment (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        start_date: Option<String>,

        /// Day of the month installments fall due (defaults to the start day)
        #[arg(long)]
        due_day: Option<u32>,

        /// Mark as a recurring charge
        #[arg(long)]
        recurring: bool,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List installment plans with their progress
    List {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Change fields of an installment plan
    Edit {
        /// Installment ID
        id: String,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        method: Option<String>,

        #[arg(long)]
        due_day: Option<u32>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Mark an installment as paid, or unpaid if it already was
    Pay {
        /// Installment ID
        id: String,

        /// Installment number (1-based)
        number: u32,
    },

    /// Per-category totals of installment plans
    Distribution,

    /// Delete an installment plan
    Delete {
        /// Installment ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum SalaryCommands {
    /// Set the monthly salary
    Set {
        /// Monthly amount (e.g., "4500.00")
        amount: String,
    },

    /// Show the current monthly salary
    Show,
}

#[derive(Subcommand)]
pub enum MemberCommands {
    /// Add a family member and their monthly contribution
    Add {
        name: String,

        /// Monthly salary (e.g., "3000.00")
        #[arg(long, default_value = "0")]
        salary: String,
    },

    /// List family members
    List,

    /// Remove a family member
    Remove {
        /// Family member ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Set the monthly limit for a category
    Set {
        /// Category key
        category: String,

        /// Monthly limit (e.g., "400" or "400.00")
        amount: String,
    },

    /// Show budget usage for a period
    List {
        #[command(flatten)]
        period: PeriodArgs,
    },

    /// Delete a category budget
    Delete {
        /// Category key
        category: String,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List categories
    List,

    /// Add a category
    Add { name: String },

    /// Remove a category; expenses keep their key
    Remove { name: String },
}

impl Cli {
    fn session(&self) -> Result<Session> {
        let user_id = self
            .user
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .context("Invalid user ID format (expected UUID)")?;
        Ok(Session::new(user_id, self.family_access))
    }

    fn scope(&self) -> Result<Scope> {
        Scope::from_str(&self.scope).ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid scope '{}'. Valid scopes: personal, family",
                self.scope
            )
        })
    }

    pub async fn run(self) -> Result<()> {
        let session = self.session()?;
        let scope = self.scope()?;

        if let Commands::Init = self.command {
            FinanceService::init(&self.database, session).await?;
            println!("Database initialized: {}", self.database);
            return Ok(());
        }

        let service = FinanceService::connect(&self.database, session)
            .await
            .with_context(|| format!("Failed to open database: {}", self.database))?;

        match self.command {
            Commands::Init => {}

            Commands::Expense(cmd) => run_expense_command(&service, scope, cmd).await?,

            Commands::Installment(cmd) => run_installment_command(&service, scope, cmd).await?,

            Commands::Salary(cmd) => run_salary_command(&service, scope, cmd).await?,

            Commands::Member(cmd) => run_member_command(&service, cmd).await?,

            Commands::Budget(cmd) => run_budget_command(&service, scope, cmd).await?,

            Commands::Category(cmd) => run_category_command(&service, cmd).await?,

            Commands::Stats { period, format } => {
                let range = period.resolve()?;
                let report = service.stats(scope, range).await?;
                match format.as_str() {
                    "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                    _ => {
                        println!("Spending {} ({})", report.range, report.scope);
                        println!(
                            "  Total: {}  Expenses: {}  Average: {}",
                            format_cents(report.stats.total),
                            report.stats.count,
                            format_cents(report.stats.average())
                        );
                        println!();
                        println!("{:<20} {:>12} {:>8}", "CATEGORY", "AMOUNT", "%");
                        println!("{}", "-".repeat(42));
                        for share in &report.categories {
                            println!(
                                "{:<20} {:>12} {:>7.1}%",
                                share.key.label(),
                                format_cents(share.amount),
                                share.percentage
                            );
                        }
                        println!();
                        println!("{:<20} {:>12} {:>8}", "PAYMENT METHOD", "AMOUNT", "%");
                        println!("{}", "-".repeat(42));
                        for share in &report.payment_methods {
                            println!(
                                "{:<20} {:>12} {:>7.1}%",
                                share.key.label(),
                                format_cents(share.amount),
                                share.percentage
                            );
                        }
                    }
                }
            }

            Commands::Insights { period, format } => {
                let range = period.resolve()?;
                let insights = service.insights(scope, range).await?;
                match format.as_str() {
                    "json" => println!("{}", serde_json::to_string_pretty(&insights)?),
                    _ => {
                        if insights.is_empty() {
                            println!("Nothing to report.");
                        }
                        for insight in insights {
                            println!("[{}] {}", insight.severity, insight.title);
                            println!("    {}", insight.description);
                        }
                    }
                }
            }

            Commands::History { format } => {
                let history = service.history(scope).await?;
                match format.as_str() {
                    "json" => println!("{}", serde_json::to_string_pretty(&history)?),
                    _ => {
                        println!(
                            "{:<8} {:>12} {:>12} {:>12}",
                            "MONTH", "EXPENSES", "INSTALLMENTS", "TOTAL"
                        );
                        println!("{}", "-".repeat(47));
                        for point in history {
                            println!(
                                "{:<8} {:>12} {:>12} {:>12}",
                                point.label,
                                format_cents(point.expenses),
                                format_cents(point.installments),
                                format_cents(point.total)
                            );
                        }
                    }
                }
            }

            Commands::Dashboard { period, format } => {
                let range = period.resolve()?;
                let dashboard = service.dashboard(scope, range).await?;
                match format.as_str() {
                    "json" => println!("{}", serde_json::to_string_pretty(&dashboard)?),
                    _ => {
                        println!("Dashboard {} ({})", dashboard.range, dashboard.scope);
                        println!("{}", "=".repeat(47));
                        println!("  Income:          {:>12}", format_cents(dashboard.income));
                        println!(
                            "  Expenses:        {:>12}",
                            format_cents(dashboard.stats.total)
                        );
                        println!(
                            "  Installments:    {:>12}",
                            format_cents(dashboard.installments_due)
                        );
                        println!("  Balance:         {:>12}", format_cents(dashboard.balance));
                        println!(
                            "  Income used:     {:>11.1}%",
                            dashboard.income_used_percent
                        );

                        if !dashboard.budgets.is_empty() {
                            println!();
                            println!(
                                "{:<20} {:>12} {:>12} {:>8}",
                                "BUDGET", "LIMIT", "SPENT", "STATUS"
                            );
                            println!("{}", "-".repeat(55));
                            for usage in &dashboard.budgets {
                                println!(
                                    "{:<20} {:>12} {:>12} {:>8}",
                                    usage.category.label(),
                                    format_cents(usage.limit),
                                    format_cents(usage.spent),
                                    usage.status.as_str()
                                );
                            }
                        }

                        if !dashboard.insights.is_empty() {
                            println!();
                            for insight in &dashboard.insights {
                                println!("[{}] {}", insight.severity, insight.title);
                            }
                        }

                        println!();
                        for point in &dashboard.history {
                            println!("  {:<8} {:>12}", point.label, format_cents(point.total));
                        }
                    }
                }
            }

            Commands::Export {
                export_type,
                output,
            } => {
                run_export_command(&service, scope, &export_type, output.as_deref()).await?;
            }
        }

        Ok(())
    }
}

impl PeriodArgs {
    /// `None` means "the current month", resolved by the service's clock.
    fn resolve(&self) -> Result<Option<DateRange>> {
        if let Some(month) = &self.month {
            let first = parse_date(&format!("{}-01", month))
                .with_context(|| format!("Invalid month '{}'. Use YYYY-MM", month))?;
            return Ok(Some(DateRange::month_of(first)));
        }
        match (&self.from, &self.to) {
            (Some(from), Some(to)) => {
                let range = DateRange::new(parse_date(from)?, parse_date(to)?);
                if range.start > range.end {
                    anyhow::bail!("Start date {} is after end date {}", from, to);
                }
                Ok(Some(range))
            }
            _ => Ok(None),
        }
    }
}

async fn run_expense_command(
    service: &FinanceService,
    scope: Scope,
    cmd: ExpenseCommands,
) -> Result<()> {
    match cmd {
        ExpenseCommands::Add {
            amount,
            description,
            category,
            method,
            date,
            notes,
        } => {
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
            let date = match date {
                Some(date_str) => parse_date(&date_str)?,
                None => service.today(),
            };

            let expense = service
                .add_expense(NewExpense {
                    description,
                    amount_cents,
                    category: Category::new(&category),
                    payment_method: parse_payment_method(&method)?,
                    date,
                    scope,
                    notes,
                })
                .await?;

            println!(
                "Recorded expense: {} {} on {} ({})",
                format_cents(expense.amount_cents),
                expense.description,
                expense.date,
                expense.id
            );
        }

        ExpenseCommands::List {
            period,
            category,
            format,
        } => {
            let range = period.resolve()?;
            let category = category.map(|name| Category::new(&name));
            let mut expenses = service.list_expenses(scope, range).await?;
            if let Some(category) = &category {
                expenses.retain(|expense| &expense.category == category);
            }

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&expenses)?),
                _ => {
                    if expenses.is_empty() {
                        println!("No expenses found.");
                        return Ok(());
                    }
                    println!(
                        "{:<10} {:<30} {:<15} {:<15} {:>12}",
                        "DATE", "DESCRIPTION", "CATEGORY", "METHOD", "AMOUNT"
                    );
                    println!("{}", "-".repeat(86));
                    for expense in &expenses {
                        println!(
                            "{:<10} {:<30} {:<15} {:<15} {:>12}",
                            expense.date,
                            truncate(&expense.description, 30),
                            truncate(&expense.category.label(), 15),
                            expense.payment_method.label(),
                            format_cents(expense.amount_cents)
                        );
                    }
                    let total: i64 = expenses.iter().map(|expense| expense.amount_cents).sum();
                    println!("{}", "-".repeat(86));
                    println!("{:<73} {:>12}", "TOTAL", format_cents(total));
                }
            }
        }

        ExpenseCommands::Edit {
            id,
            amount,
            description,
            category,
            method,
            date,
            notes,
        } => {
            let update = ExpenseUpdate {
                description,
                amount_cents: amount
                    .map(|a| parse_cents(&a))
                    .transpose()
                    .context("Invalid amount format. Use '50.00' or '50'")?,
                category: category.map(|name| Category::new(&name)),
                payment_method: method.as_deref().map(parse_payment_method).transpose()?,
                date: date.as_deref().map(parse_date).transpose()?,
                notes,
            };
            let expense = service.update_expense(parse_id(&id)?, update).await?;
            println!(
                "Updated expense: {} {} ({})",
                format_cents(expense.amount_cents),
                expense.description,
                expense.id
            );
        }

        ExpenseCommands::Delete { id } => {
            let expense = service.delete_expense(parse_id(&id)?).await?;
            println!(
                "Deleted expense: {} {}",
                format_cents(expense.amount_cents),
                expense.description
            );
        }
    }

    Ok(())
}

async fn run_installment_command(
    service: &FinanceService,
    scope: Scope,
    cmd: InstallmentCommands,
) -> Result<()> {
    use chrono::Datelike;

    match cmd {
        InstallmentCommands::Add {
            amount,
            description,
            count,
            category,
            method,
            start_date,
            due_day,
            recurring,
            notes,
        } => {
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '1200.00' or '1200'")?;
            let start_date = match start_date {
                Some(date_str) => parse_date(&date_str)?,
                None => service.today(),
            };

            let installment = service
                .add_installment(NewInstallment {
                    description,
                    amount_cents,
                    count,
                    category: Category::new(&category),
                    payment_method: parse_payment_method(&method)?,
                    start_date,
                    due_day: due_day.unwrap_or_else(|| start_date.day()),
                    scope,
                    recurring,
                    notes,
                })
                .await?;

            match installment.count() {
                Some(count) => println!(
                    "Created installment plan: {} in {}x of {} ({})",
                    installment.description,
                    count,
                    format_cents(installment.installment_amount_cents),
                    installment.id
                ),
                None => println!(
                    "Created monthly charge: {} of {} ({})",
                    installment.description,
                    format_cents(installment.installment_amount_cents),
                    installment.id
                ),
            }
        }

        InstallmentCommands::List { format } => {
            let summaries = service.installment_summaries(scope).await?;
            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&summaries)?),
                _ => {
                    if summaries.is_empty() {
                        println!("No installment plans found.");
                        return Ok(());
                    }
                    println!(
                        "{:<36} {:<24} {:>10} {:>7} {:>12} {:>6} {:<10}",
                        "ID", "DESCRIPTION", "AMOUNT", "PAID", "REMAINING", "%", "NEXT DUE"
                    );
                    println!("{}", "-".repeat(112));
                    for summary in summaries {
                        let paid = match summary.count {
                            Some(count) => format!("{}/{}", summary.paid_count, count),
                            None => format!("{}/-", summary.paid_count),
                        };
                        println!(
                            "{:<36} {:<24} {:>10} {:>7} {:>12} {:>6} {:<10}",
                            summary.id,
                            truncate(&summary.description, 24),
                            format_cents(summary.installment_amount),
                            paid,
                            summary.remaining.map(format_cents).unwrap_or_else(|| "-".into()),
                            summary
                                .progress
                                .map(|p| format!("{:.0}", p))
                                .unwrap_or_else(|| "-".into()),
                            summary
                                .next_due_date
                                .map(|d| d.to_string())
                                .unwrap_or_else(|| "done".into()),
                        );
                    }
                }
            }
        }

        InstallmentCommands::Edit {
            id,
            description,
            category,
            method,
            due_day,
            notes,
        } => {
            let update = InstallmentUpdate {
                description,
                category: category.map(|name| Category::new(&name)),
                payment_method: method.as_deref().map(parse_payment_method).transpose()?,
                due_day,
                notes,
                ..Default::default()
            };
            let installment = service.update_installment(parse_id(&id)?, update).await?;
            println!("Updated installment plan: {} ({})", installment.description, installment.id);
        }

        InstallmentCommands::Pay { id, number } => {
            let toggle = service
                .toggle_installment_paid(parse_id(&id)?, number)
                .await?;
            println!(
                "Installment {} of {} marked as {}",
                toggle.number,
                toggle.installment.description,
                if toggle.paid { "paid" } else { "unpaid" }
            );
        }

        InstallmentCommands::Distribution => {
            let shares = service.installment_distribution(scope).await?;
            if shares.is_empty() {
                println!("No installment plans found.");
                return Ok(());
            }
            println!("{:<20} {:>12} {:>8}", "CATEGORY", "AMOUNT", "%");
            println!("{}", "-".repeat(42));
            for share in shares {
                println!(
                    "{:<20} {:>12} {:>7.1}%",
                    share.key.label(),
                    format_cents(share.amount),
                    share.percentage
                );
            }
        }

        InstallmentCommands::Delete { id } => {
            let installment = service.delete_installment(parse_id(&id)?).await?;
            println!("Deleted installment plan: {}", installment.description);
        }
    }

    Ok(())
}

async fn run_salary_command(
    service: &FinanceService,
    scope: Scope,
    cmd: SalaryCommands,
) -> Result<()> {
    match cmd {
        SalaryCommands::Set { amount } => {
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '4500.00' or '4500'")?;
            let salary = service.set_salary(scope, amount_cents).await?;
            println!(
                "Set {} salary: {}",
                salary.scope,
                format_cents(salary.amount_cents)
            );
        }

        SalaryCommands::Show => match service.get_salary(scope).await? {
            Some(salary) => println!(
                "{} salary: {} (updated {})",
                salary.scope,
                format_cents(salary.amount_cents),
                salary.updated_at.format("%Y-%m-%d")
            ),
            None => println!("No {} salary set.", scope),
        },
    }

    Ok(())
}

async fn run_member_command(service: &FinanceService, cmd: MemberCommands) -> Result<()> {
    match cmd {
        MemberCommands::Add { name, salary } => {
            let salary_cents =
                parse_cents(&salary).context("Invalid amount format. Use '3000.00' or '3000'")?;
            let member = service.add_family_member(name, salary_cents).await?;
            println!(
                "Added family member: {} ({}) ({})",
                member.name,
                format_cents(member.monthly_salary_cents),
                member.id
            );
        }

        MemberCommands::List => {
            let members = service.list_family_members().await?;
            if members.is_empty() {
                println!("No family members found.");
                return Ok(());
            }
            println!("{:<36} {:<20} {:>12}", "ID", "NAME", "SALARY");
            println!("{}", "-".repeat(70));
            for member in &members {
                println!(
                    "{:<36} {:<20} {:>12}",
                    member.id,
                    truncate(&member.name, 20),
                    format_cents(member.monthly_salary_cents)
                );
            }
            println!("{}", "-".repeat(70));
            println!(
                "{:<57} {:>12}",
                "TOTAL",
                format_cents(service.family_salary_total().await?)
            );
        }

        MemberCommands::Remove { id } => {
            service.remove_family_member(parse_id(&id)?).await?;
            println!("Removed family member: {}", id);
        }
    }

    Ok(())
}

async fn run_budget_command(
    service: &FinanceService,
    scope: Scope,
    cmd: BudgetCommands,
) -> Result<()> {
    match cmd {
        BudgetCommands::Set { category, amount } => {
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '400.00' or '400'")?;
            let budget = service
                .set_budget(scope, Category::new(&category), amount_cents)
                .await?;
            println!(
                "Set budget: {} {} per month",
                budget.category.label(),
                format_cents(budget.monthly_limit_cents)
            );
        }

        BudgetCommands::List { period } => {
            let usages = service.budget_usages(scope, period.resolve()?).await?;
            if usages.is_empty() {
                println!("No budgets found.");
                return Ok(());
            }
            println!(
                "{:<20} {:>12} {:>12} {:>12} {:>7} {:<9}",
                "CATEGORY", "LIMIT", "SPENT", "REMAINING", "%", "STATUS"
            );
            println!("{}", "-".repeat(77));
            for usage in usages {
                println!(
                    "{:<20} {:>12} {:>12} {:>12} {:>6.1}% {:<9}",
                    truncate(&usage.category.label(), 20),
                    format_cents(usage.limit),
                    format_cents(usage.spent),
                    format_cents(usage.remaining),
                    usage.percentage,
                    usage.status.as_str()
                );
            }
        }

        BudgetCommands::Delete { category } => {
            let category = Category::new(&category);
            service.delete_budget(scope, &category).await?;
            println!("Deleted budget: {}", category.label());
        }
    }

    Ok(())
}

async fn run_category_command(service: &FinanceService, cmd: CategoryCommands) -> Result<()> {
    match cmd {
        CategoryCommands::List => {
            let categories = service.categories().await?;
            println!("{:<20} {:<20}", "KEY", "LABEL");
            println!("{}", "-".repeat(40));
            for category in categories.iter() {
                println!("{:<20} {:<20}", category, category.label());
            }
        }

        CategoryCommands::Add { name } => {
            let category = service.add_category(&name).await?;
            println!("Added category: {} ({})", category.label(), category);
        }

        CategoryCommands::Remove { name } => {
            let category = service.remove_category(&name).await?;
            println!("Removed category: {}", category);
        }
    }

    Ok(())
}

/// What `gastos export` writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportKind {
    Expenses,
    Installments,
    Full,
}

fn parse_export_kind(s: &str) -> Result<ExportKind> {
    match s {
        "expenses" => Ok(ExportKind::Expenses),
        "installments" => Ok(ExportKind::Installments),
        "full" => Ok(ExportKind::Full),
        _ => anyhow::bail!(
            "Invalid export type '{}'. Valid types: expenses, installments, full",
            s
        ),
    }
}

async fn run_export_command(
    service: &FinanceService,
    scope: Scope,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{stdout, Write};

    // Reject unknown types before touching the output file
    let kind = parse_export_kind(export_type)?;
    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match kind {
        ExportKind::Expenses => {
            let count = exporter.export_expenses_csv(scope, writer).await?;
            if output.is_some() {
                eprintln!("Exported {} expenses", count);
            }
        }
        ExportKind::Installments => {
            let count = exporter.export_installments_csv(scope, writer).await?;
            if output.is_some() {
                eprintln!("Exported {} installment plans", count);
            }
        }
        ExportKind::Full => {
            let snapshot = exporter.export_full_json(writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported full database: {} expenses, {} installment plans, {} budgets",
                    snapshot.expenses.len(),
                    snapshot.installments.len(),
                    snapshot.budgets.len()
                );
            }
        }
    }

    Ok(())
}

fn parse_payment_method(s: &str) -> Result<PaymentMethod> {
    PaymentMethod::from_str(s).ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid payment method '{}'. Valid methods: dinheiro, debito, credito, pix, transferencia",
            s
        )
    })
}

fn parse_id(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).context("Invalid ID format (expected UUID)")
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", date_str))
}
