//! Template-based video title ideas for a niche category.

use rand::prelude::*;

use crate::error::{AppError, Result};

type Pool = (&'static str, &'static [&'static str]);

struct IdeaTemplates {
    templates: &'static [&'static str],
    pools: &'static [Pool],
}

const COUNTS: &[&str] = &["5", "7", "10", "12", "15"];
const YEARS: &[&str] = &["2025", "2026"];
const TIME_PERIODS: &[&str] = &["7 Days", "2 Weeks", "30 Days", "One Month"];

const FINANCE: IdeaTemplates = IdeaTemplates {
    templates: &[
        "Top {n} Ways to {action} Your {financial_item} in {year}",
        "How to {action} {financial_item} - Complete Guide for Beginners",
        "The Truth About {financial_item} That Nobody Tells You",
        "{n} {financial_item} Mistakes to Avoid in {year}",
        "Why {financial_item} Is the Best Investment for {target_audience}",
    ],
    pools: &[
        ("n", COUNTS),
        ("action", &["Grow", "Invest", "Save", "Manage", "Maximize", "Protect"]),
        (
            "financial_item",
            &["Money", "Investments", "Retirement Fund", "Stock Portfolio", "Crypto Assets", "Savings"],
        ),
        ("year", YEARS),
        ("target_audience", &["Beginners", "Young Adults", "Retirees", "Entrepreneurs", "Everyone"]),
    ],
};

const TECHNOLOGY: IdeaTemplates = IdeaTemplates {
    templates: &[
        "{product} Review - Is It Worth It in {year}?",
        "Top {n} {product_type} for {use_case} in {year}",
        "How to {action} with {product} - Step by Step Tutorial",
        "{n} Hidden Features of {product} You Didn't Know About",
        "Why {product} is Better Than {competitor_product}",
    ],
    pools: &[
        ("n", COUNTS),
        (
            "product",
            &["iPhone 16", "Samsung Galaxy S25", "MacBook Pro", "Windows 11", "iPad Pro", "Tesla Model Y"],
        ),
        (
            "product_type",
            &["Smartphones", "Laptops", "Tablets", "Smart Home Devices", "Cameras", "Headphones"],
        ),
        ("use_case", &["Productivity", "Gaming", "Content Creation", "Students", "Professionals"]),
        (
            "action",
            &["Edit Videos", "Take Better Photos", "Increase Productivity", "Save Battery Life", "Customize"],
        ),
        ("year", YEARS),
        (
            "competitor_product",
            &["Android", "iPhone", "Windows PC", "MacBook", "Google Home", "Alexa"],
        ),
    ],
};

const HEALTH: IdeaTemplates = IdeaTemplates {
    templates: &[
        "Top {n} {health_item} for {health_goal}",
        "How to {action} Your {body_part} in Just {time_period}",
        "{n} {diet_type} Recipes for {health_goal}",
        "The Truth About {health_topic} - What Doctors Won't Tell You",
        "Why You Should Start {health_activity} Today",
    ],
    pools: &[
        ("n", COUNTS),
        ("health_item", &["Supplements", "Exercises", "Foods", "Habits", "Workouts"]),
        ("health_goal", &["Weight Loss", "Muscle Gain", "Better Sleep", "More Energy", "Longevity"]),
        ("action", &["Strengthen", "Tone", "Improve", "Heal", "Detox"]),
        ("body_part", &["Abs", "Core", "Back", "Arms", "Legs", "Whole Body"]),
        ("time_period", TIME_PERIODS),
        ("diet_type", &["Keto", "Vegan", "Paleo", "Mediterranean", "Low-Carb"]),
        ("health_topic", &["Vitamins", "Fasting", "Cardio", "Strength Training", "Supplements"]),
        (
            "health_activity",
            &["Yoga", "Meditation", "Intermittent Fasting", "Strength Training", "Walking"],
        ),
    ],
};

const BUSINESS: IdeaTemplates = IdeaTemplates {
    templates: &[
        "{n} Ways to {action} Your {business_type} in {year}",
        "How to Start a {business_type} with Just ${amount}",
        "The Secret to {business_goal} That Nobody Talks About",
        "Why {business_strategy} Is Essential for {business_type} Owners",
        "{n} {business_tool} Tools Every {professional_type} Needs",
    ],
    pools: &[
        ("n", COUNTS),
        ("action", &["Grow", "Scale", "Market", "Automate", "Optimize"]),
        (
            "business_type",
            &["E-commerce Store", "SaaS Business", "Consulting Practice", "YouTube Channel", "Startup"],
        ),
        ("year", YEARS),
        ("amount", &["100", "500", "1000", "5000"]),
        (
            "business_goal",
            &["Passive Income", "Customer Acquisition", "Brand Building", "Sales Growth"],
        ),
        (
            "business_strategy",
            &["Content Marketing", "SEO", "Social Media", "Email Marketing", "Automation"],
        ),
        ("business_tool", &["Marketing", "Productivity", "Accounting", "CRM", "Analytics"]),
        (
            "professional_type",
            &["Entrepreneurs", "Freelancers", "Small Business Owners", "Marketers", "Creators"],
        ),
    ],
};

const EDUCATION: IdeaTemplates = IdeaTemplates {
    templates: &[
        "Learn {subject} in {time_period} - Complete Guide",
        "Top {n} Resources to Master {subject}",
        "Why {subject} Is Important for {career_path}",
        "How to {action} {subject} - From Beginner to Expert",
        "{n} {subject} Exercises to Improve Your Skills",
    ],
    pools: &[
        ("n", COUNTS),
        (
            "subject",
            &["Python Programming", "Digital Marketing", "Data Science", "Graphic Design", "Public Speaking"],
        ),
        ("time_period", TIME_PERIODS),
        (
            "career_path",
            &["Tech Careers", "Marketing", "Business", "Creative Fields", "Personal Development"],
        ),
        ("action", &["Master", "Learn", "Understand", "Practice", "Teach"]),
    ],
};

fn templates_for(category: &str) -> Option<&'static IdeaTemplates> {
    match category {
        "finance" => Some(&FINANCE),
        "technology" => Some(&TECHNOLOGY),
        "health" => Some(&HEALTH),
        "business" => Some(&BUSINESS),
        "education" => Some(&EDUCATION),
        _ => None,
    }
}

/// `count` title ideas for `category`, using the thread-local RNG.
pub fn generate_topic_ideas(category: &str, count: usize) -> Result<Vec<String>> {
    generate_topic_ideas_with(category, count, &mut thread_rng())
}

/// Same as [`generate_topic_ideas`] with a caller-supplied RNG.
pub fn generate_topic_ideas_with<R: Rng + ?Sized>(
    category: &str,
    count: usize,
    rng: &mut R,
) -> Result<Vec<String>> {
    let set = templates_for(category).ok_or_else(|| AppError::UnknownCategory(category.to_string()))?;

    let mut ideas = Vec::with_capacity(count);
    for _ in 0..count {
        let Some(template) = set.templates.choose(rng) else {
            break;
        };
        let mut idea = template.to_string();
        for (key, values) in set.pools {
            let placeholder = format!("{{{key}}}");
            if idea.contains(&placeholder) {
                if let Some(value) = values.choose(rng) {
                    idea = idea.replace(&placeholder, value);
                }
            }
        }
        ideas.push(idea);
    }
    Ok(ideas)
}
