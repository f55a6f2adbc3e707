use anyhow::Result;
use repopulse_core::{validate_days, NotificationTask, RepoSummary, TaskRequest};
use repopulse_engine::{DispatchOutcome, Services, TrackedView};

use crate::cli::{Commands, TaskArgs, TaskCommands};

pub async fn execute(command: Commands, services: Services) -> Result<()> {
    let lookback = |days: Option<i64>| -> Result<u32> {
        Ok(match days {
            Some(days) => validate_days(days)?,
            None => services.settings.lookback_days,
        })
    };

    match command {
        Commands::Track { repo } => {
            if services.tracker.track(&repo).await? {
                println!("✓ Tracking {}", repo);
            } else {
                println!("{} is already tracked", repo);
            }
        }

        Commands::Untrack { repo } => {
            if services.tracker.untrack(&repo).await? {
                println!("✓ Stopped tracking {}", repo);
            } else {
                println!("{} was not tracked", repo);
            }
        }

        Commands::Tracked { days } => {
            let days = lookback(days)?;
            let views = services.tracker.tracked_views(days).await?;
            if views.is_empty() {
                println!("No tracked repositories");
            }
            for view in &views {
                print_view_line(view);
            }
        }

        Commands::Refresh { repo, days } => {
            let days = lookback(days)?;
            let results = match repo {
                Some(repo) => vec![services.tracker.refresh_repo(&repo, days).await?],
                None => services.tracker.refresh_all(days).await?,
            };

            for result in &results {
                match &result.error {
                    None => println!("✓ {}: {} items", result.repository, result.items),
                    Some(error) => println!("✗ {}: {}", result.repository, error),
                }
            }
            let failed = results.iter().filter(|r| !r.success).count();
            println!("\nRefreshed {} of {} repositories", results.len() - failed, results.len());
        }

        Commands::Trending { save, summary } => {
            let repos = if save {
                let capture = services.trending.capture().await?;
                println!("{}\n", capture.description);
                capture.repositories
            } else {
                services.trending.trending().await?
            };
            print_repos(&repos);

            if summary {
                match &services.summary {
                    Some(service) => println!("\n{}", service.hot_repos_summary(&repos).await?),
                    None => println!("\nNo language model configured; set LLM_PROVIDER for summaries"),
                }
            }
        }

        Commands::Search { query, limit } => {
            let repos = services.trending.search(&query, limit).await?;
            print_repos(&repos);
        }

        Commands::Show { repo, days } => {
            let days = lookback(days)?;
            let view = services.tracker.view(&repo, days).await?;
            match services.trending.repository(&repo).await {
                Ok(details) => print_repos(&[details]),
                Err(e) => tracing::warn!("Repository details unavailable: {}", e),
            }
            print_view_line(&view);
            for activity in &view.activities {
                println!(
                    "  [{}] {}  {} ({})",
                    activity.kind(),
                    activity.timestamp.format("%Y-%m-%d %H:%M"),
                    activity.title_zh.as_deref().unwrap_or_else(|| activity.headline()),
                    activity.state_or_author()
                );
            }
        }

        Commands::Task { command } => execute_task_command(command, &services).await?,

        Commands::Serve { port } => {
            let port = port.unwrap_or(services.settings.api_port);
            let armed = services.dispatcher.arm_all().await?;
            println!("✓ {} notification tasks armed", armed);

            let served = repopulse_api::serve(&services, port).await;
            services.scheduler().shutdown().await;
            served?;
        }

        Commands::Daemon => {
            let armed = services.dispatcher.arm_all().await?;
            services.start_trending_capture().await;
            println!("✓ {} notification tasks armed, trending capture scheduled", armed);
            println!("  Press Ctrl-C to stop");

            tokio::signal::ctrl_c().await?;
            tracing::info!("Shutdown signal received");
            services.scheduler().shutdown().await;
        }
    }

    Ok(())
}

async fn execute_task_command(command: TaskCommands, services: &Services) -> Result<()> {
    let dispatcher = &services.dispatcher;

    match command {
        TaskCommands::Add(args) => {
            let task = dispatcher.create(task_request(args)).await?;
            println!("✓ Task created: {}", task.id);
            print_task(&task);

            // an immediate task runs on its own trigger; wait for it before exiting
            if !task.cadence.is_recurring() {
                services.scheduler().shutdown().await;
            }
        }

        TaskCommands::Update { id, args } => {
            let task = dispatcher.update(&id, task_request(args)).await?;
            println!("✓ Task updated: {}", task.id);
            print_task(&task);

            if !task.cadence.is_recurring() {
                services.scheduler().shutdown().await;
            }
        }

        TaskCommands::Remove { id } => {
            let task = dispatcher.delete(&id).await?;
            println!("✓ Task removed: {}", task.id);
        }

        TaskCommands::List => {
            let tasks = dispatcher.list().await?;
            if tasks.is_empty() {
                println!("No notification tasks");
            }
            for task in &tasks {
                println!("{}", task.id);
                print_task(task);
            }
        }

        TaskCommands::Run { id } => match dispatcher.execute_now(&id).await? {
            DispatchOutcome::Delivered(digest) => {
                println!(
                    "✓ Digest sent: {} repositories, {} updates",
                    digest.repositories.len(),
                    digest.total
                );
            }
            DispatchOutcome::NoUpdates => println!("No updates; nothing sent"),
            DispatchOutcome::Skipped(digest) => {
                println!("Mail is not configured; digest not sent:\n");
                println!("{}", digest.html);
            }
        },
    }

    Ok(())
}

fn task_request(args: TaskArgs) -> TaskRequest {
    TaskRequest {
        email: args.email,
        repositories: args.repositories,
        frequency: args.frequency,
        weekday: args.weekday,
        month_day: args.month_day,
        execute_time: args.time,
    }
}

fn print_task(task: &NotificationTask) {
    println!("  Recipient: {}", task.recipient);
    println!("  Cadence: {} at {}", task.cadence, task.time_of_day.format("%H:%M"));
    let repositories: Vec<&str> = task.repositories.iter().map(String::as_str).collect();
    println!("  Repositories: {}", repositories.join(", "));
}

fn print_view_line(view: &TrackedView) {
    let last = view
        .last_updated
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());
    println!(
        "{}  commits {}  issues {}  PRs {}  releases {}  (snapshot: {})",
        view.full_name,
        view.counts.commits,
        view.counts.issues,
        view.counts.pull_requests,
        view.counts.releases,
        last
    );
}

fn print_repos(repos: &[RepoSummary]) {
    if repos.is_empty() {
        println!("No repositories found");
    }
    for repo in repos {
        let name = match &repo.name_zh {
            Some(translated) => format!("{} ({})", repo.full_name, translated),
            None => repo.full_name.clone(),
        };
        println!("★ {:>6}  {}", repo.stars, name);
        if let Some(description) = repo.description_zh.as_ref().or(repo.description.as_ref()) {
            println!("          {}", description);
        }
        println!("          {}", repo.url);
    }
}
