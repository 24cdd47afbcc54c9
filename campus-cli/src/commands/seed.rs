//! Seed command - demo users and one request in every stage

use campus_core::{Config, LetterService, LetterType, Role, UserDirectory};
use campus_db::Database;
use clap::Args;

use super::open_database;

const DEMO_USERS: &[(&str, &str, Role)] = &[
    ("Portal Admin", "admin@campus.ac.id", Role::Admin),
    ("Rina Kusuma", "umum@campus.ac.id", Role::AdminUmum),
    ("Dr. Hadi Santoso", "wd1@campus.ac.id", Role::Wd1),
    ("Prof. Dewi Lestari", "dean@campus.ac.id", Role::Dean),
    ("Agus Finance", "finance@campus.ac.id", Role::FinanceAdmin),
    ("Maya GKM", "gkm@campus.ac.id", Role::Gkm),
    ("Yoga Lab", "lab@campus.ac.id", Role::LabAdmin),
    ("Ir. Bambang", "lecturer@campus.ac.id", Role::Lecturer),
    ("Siti Rahma", "siti@student.campus.ac.id", Role::Student),
    ("Budi Pratama", "budi@student.campus.ac.id", Role::Student),
];

/// Load demo users and requests
#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Only create users
    #[arg(long)]
    users_only: bool,
}

impl SeedArgs {
    /// Execute the seed command
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let db = open_database(config)?;
        self.run(&db)
    }

    fn run(&self, db: &Database) -> anyhow::Result<()> {
        let directory = UserDirectory::new(db);

        let mut users = Vec::with_capacity(DEMO_USERS.len());
        for (name, email, role) in DEMO_USERS {
            let user = match directory.find_by_email(email)? {
                Some(existing) => existing,
                None => directory.register(name, email, *role)?,
            };
            println!("  {:>4}  {:<14} {}", user.id, user.role.as_str(), user.email);
            users.push(user);
        }

        if self.users_only {
            return Ok(());
        }

        let id_of = |email: &str| -> anyhow::Result<i64> {
            users
                .iter()
                .find(|u| u.email == email)
                .map(|u| u.id)
                .ok_or_else(|| anyhow::anyhow!("Demo user {} missing", email))
        };
        let reviewer = id_of("umum@campus.ac.id")?;
        let wd1 = id_of("wd1@campus.ac.id")?;
        let dean = id_of("dean@campus.ac.id")?;
        let siti = id_of("siti@student.campus.ac.id")?;
        let budi = id_of("budi@student.campus.ac.id")?;

        let service = LetterService::new(db);

        let mut existing = service.list_for_student(siti)?;
        existing.extend(service.list_for_student(budi)?);
        if !existing.is_empty() {
            println!();
            println!("Demo students already have requests; skipping request seeding.");
            return Ok(());
        }

        let pending = service.submit(
            siti,
            LetterType::ActiveStudent,
            "Active student letter for scholarship",
            Some("Beasiswa PPA application"),
        )?;

        let waiting = service.submit(
            budi,
            LetterType::ResearchPermit,
            "Research permit for thesis fieldwork",
            Some("Data collection at PT Sumber Makmur"),
        )?;
        service.forward(reviewer, waiting.id, Some(wd1), None)?;

        let approved = service.submit(
            siti,
            LetterType::KkpRecommendation,
            "KKP recommendation",
            None,
        )?;
        service.forward(reviewer, approved.id, None, Some("Documents complete"))?;
        service.approve(dean, approved.id, Some("Approved for semester 7"))?;

        let returned = service.submit(budi, LetterType::Transcript, "Transcript", None)?;
        service.return_for_revision(reviewer, returned.id, "Attach latest KRS")?;

        let rejected = service.submit(
            siti,
            LetterType::LeaveOfAbsence,
            "Leave of absence",
            Some("Family matters"),
        )?;
        service.forward(reviewer, rejected.id, None, None)?;
        service.reject(wd1, rejected.id, "Leave quota for this year is used up")?;

        println!();
        for id in [pending.id, waiting.id, approved.id, returned.id, rejected.id] {
            let request = service.get(id)?;
            println!(
                "  request {:>4}  {:<20} {}",
                request.id,
                request.state.stage.as_str(),
                request.title
            );
        }

        Ok(())
    }
}
