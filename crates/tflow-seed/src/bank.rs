//! Fixed vocabularies the seed generator draws from.

pub const JOB_TITLES: [&str; 25] = [
    "HR Specialist",
    "Sales Representative",
    "UI/UX Designer",
    "Product Manager",
    "Marketing Manager",
    "Project Manager",
    "Business Analyst",
    "Data Analyst",
    "Product Analyst",
    "Data Scientist",
    "Junior SDE",
    "Senior SDE",
    "HR Intern",
    "Sales Intern",
    "Design Intern",
    "Backend Engineer",
    "Frontend Engineer",
    "DevOps Engineer",
    "QA Engineer",
    "Customer Success Manager",
    "Technical Writer",
    "Recruiter",
    "Operations Manager",
    "Growth Marketer",
    "Program Manager",
];

pub const TAGS: [&str; 10] = [
    "HR", "Sales", "UI/UX", "Product", "Marketing", "Project", "Business", "Data", "SDE",
    "Intern",
];

pub const REQUIREMENTS: [&str; 3] = [
    "Bachelor's degree or equivalent experience",
    "Strong communication skills",
    "Proficiency with modern tooling",
];

pub const SCOPE: &str =
    "Own end-to-end execution and collaborate with stakeholders to drive outcomes.";

pub const STIPEND: &str = "₹25,000/month";

pub const SKILLS: [&str; 13] = [
    "Communication",
    "React",
    "Node",
    "SQL",
    "Python",
    "Data Analysis",
    "Product",
    "Design",
    "Leadership",
    "Testing",
    "Marketing",
    "Sales",
    "Recruiting",
];

pub const FIRST_NAMES: [&str; 20] = [
    "Aarav", "Vivaan", "Aditya", "Vihaan", "Arjun", "Sai", "Ayaan", "Krishna", "Ishaan", "Rohan",
    "Sara", "Ananya", "Diya", "Aadhya", "Pari", "Anaya", "Aarohi", "Myra", "Ira", "Aisha",
];

pub const LAST_NAMES: [&str; 10] = [
    "Sharma", "Verma", "Patel", "Reddy", "Gupta", "Kumar", "Singh", "Iyer", "Das", "Nair",
];

pub const STREETS: [&str; 4] = ["MG Road", "Brigade Road", "Park Street", "Main Street"];

pub const GENDERS: [&str; 3] = ["male", "female", "other"];

pub const SECTION_TITLES: [&str; 3] = ["Assessment A", "Assessment B", "Assessment C"];

pub const SDE_PROMPTS: [&str; 5] = [
    "Implement an algorithm to find the longest increasing subsequence and explain complexity.",
    "Write a function to detect if two strings are anagrams.",
    "Implement merge sort and explain its space/time complexity.",
    "Design a URL shortener data model and API endpoints.",
    "Describe a debounce vs throttle implementation in JS.",
];

pub const DATA_PROMPTS: [&str; 5] = [
    "Explain how you would clean and prepare data for a machine learning model.",
    "Write SQL to find the top 3 products by sales this month.",
    "Describe how you would detect outliers in a dataset.",
    "Explain the bias-variance tradeoff.",
    "How would you validate a predictive model in production?",
];

pub const DESIGN_PROMPTS: [&str; 5] = [
    "Design a mobile onboarding flow for a social app and explain decisions.",
    "How would you improve the conversion rate of a signup form?",
    "Sketch (describe) a responsive dashboard layout for analytics.",
    "Describe how you would conduct usability testing for a new feature.",
    "Explain the tradeoffs between low-fidelity and high-fidelity prototypes.",
];

pub const HR_PROMPTS: [&str; 5] = [
    "Describe your approach to screening resumes for a role.",
    "How would you handle a high-performing employee who requests a raise beyond budget?",
    "Explain how you'd build an inclusive hiring process.",
    "Describe a time you resolved a conflict in a team.",
    "What metrics would you track for recruiting effectiveness?",
];

pub const SALES_PROMPTS: [&str; 5] = [
    "Pitch a product to a potential enterprise client highlighting ROI.",
    "How would you handle an objection about price from a prospect?",
    "Describe how you would qualify leads for a SaaS product.",
    "Explain steps to negotiate contract terms with a client.",
    "How do you prioritize accounts in an account-based sales strategy?",
];

pub const LOGICAL_PROMPTS: [&str; 3] = [
    "You have 9 balls, one is lighter. How do you find it with 2 weighings?",
    "If a train travels 60 miles in 1.5 hours, what's its average speed?",
    "Explain a strategy to solve the river crossing puzzle.",
];

pub struct ChoiceQuestion {
    pub label: &'static str,
    pub options: [&'static str; 4],
}

pub const SINGLE_CHOICE: [ChoiceQuestion; 3] = [
    ChoiceQuestion {
        label: "What does HTTP stand for?",
        options: [
            "HyperText Transfer Protocol",
            "High Transfer Text Protocol",
            "Hyperlink Transfer Protocol",
            "HyperText Transmission Protocol",
        ],
    },
    ChoiceQuestion {
        label: "Who invented the World Wide Web?",
        options: ["Tim Berners-Lee", "Vint Cerf", "Linus Torvalds", "Alan Turing"],
    },
    ChoiceQuestion {
        label: "What is the time complexity of binary search?",
        options: ["O(log n)", "O(n)", "O(n log n)", "O(1)"],
    },
];

pub const MULTI_CHOICE: [ChoiceQuestion; 2] = [
    ChoiceQuestion {
        label: "Which data structure is LIFO?",
        options: ["Stack", "Queue", "Tree", "Graph"],
    },
    ChoiceQuestion {
        label: "Which SQL clause is used to filter results?",
        options: ["WHERE", "ORDER BY", "GROUP BY", "HAVING"],
    },
];
